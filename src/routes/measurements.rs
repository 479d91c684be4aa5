//! # 신체 측정 라우트 핸들러
//!
//! ## 엔드포인트
//! - `GET    /api/v1/measurements?type=weight&limit=30` → 목록 (측정일 최신순, 기본 100건)
//! - `POST   /api/v1/measurements`                      → 기록 추가 (`date` 생략 시 지금)
//! - `GET    /api/v1/measurements/latest`               → 종류별 최신값
//! - `GET    /api/v1/measurements/{id}`                 → 단건 조회
//! - `PATCH  /api/v1/measurements/{id}`                 → 부분 수정
//! - `DELETE /api/v1/measurements/{id}`                 → 삭제

use crate::{
    db,
    error::AppError,
    middleware::auth::AuthUser,
    models::{schema::validated, *},
    routes::AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

pub async fn list_measurements(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<MeasurementListQuery>,
) -> Result<Json<Value>, AppError> {
    let limit = query
        .limit
        .unwrap_or(state.config.measurement_history_limit)
        .max(1);
    let measurements =
        db::list_measurements(&state.pool, &auth.user_id, query.kind, limit).await?;
    Ok(Json(json!({ "measurements": measurements })))
}

/// `{ "latest": { "weight": {...}, "bodyFat": {...} } }`. 측정한 적 없는 종류는 빠집니다.
pub async fn latest_measurements(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Value>, AppError> {
    let latest = db::latest_measurements(&state.pool, &auth.user_id).await?;
    Ok(Json(json!({ "latest": latest })))
}

pub async fn get_measurement(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Measurement>, AppError> {
    let measurement = db::get_measurement(&state.pool, &auth.user_id, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(measurement))
}

pub async fn create_measurement(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateMeasurementRequest>,
) -> Result<(StatusCode, Json<Measurement>), AppError> {
    let req = validated(req)?;
    let measurement = db::create_measurement(&state.pool, &auth.user_id, &req).await?;
    Ok((StatusCode::CREATED, Json(measurement)))
}

pub async fn update_measurement(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateMeasurementRequest>,
) -> Result<Json<Measurement>, AppError> {
    let req = validated(req)?;
    let measurement = db::update_measurement(&state.pool, &auth.user_id, &id, &req)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(measurement))
}

pub async fn delete_measurement(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if !db::delete_measurement(&state.pool, &auth.user_id, &id).await? {
        return Err(AppError::NotFound);
    }
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::{call, test_app};
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn latest_is_keyed_by_measurement_type() {
        let app = test_app().await;
        for (value, date) in [(82.0, "2026-02-01T07:00:00Z"), (80.5, "2026-03-01T07:00:00Z")] {
            let body = json!({ "type": "weight", "value": value, "unit": "kg", "date": date });
            let (status, _) = call(&app, "POST", "/measurements", "u1", Some(body)).await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (_, body) = call(&app, "GET", "/measurements/latest", "u1", None).await;
        assert_eq!(body["latest"]["weight"]["value"], 80.5);
        assert!(body["latest"].get("bodyFat").is_none());

        let (_, listed) = call(&app, "GET", "/measurements?type=weight&limit=1", "u1", None).await;
        assert_eq!(listed["measurements"].as_array().unwrap().len(), 1);
    }
}
