//! # 개인 기록 라우트 핸들러
//!
//! ## 엔드포인트
//! - `GET    /api/v1/records?exercise_id=...` → 목록 (최신순, 운동별 필터)
//! - `POST   /api/v1/records`                 → 직접 입력
//! - `GET    /api/v1/records/best`            → 운동별 최고 기록
//! - `GET    /api/v1/records/{id}`            → 단건 조회
//! - `DELETE /api/v1/records/{id}`            → 삭제
//!
//! 세트 완료로 생기는 기록은 라이브 세션이 자동으로 판정해 저장합니다.

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

pub async fn list_records(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<RecordListQuery>,
) -> Result<Json<Value>, AppError> {
    let records =
        db::list_records(&state.pool, &auth.user_id, query.exercise_id.as_deref()).await?;
    Ok(Json(json!({ "records": records })))
}

/// `{ "best": { "<exercise_id>": {...}, ... } }`
pub async fn best_records(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Value>, AppError> {
    let best = db::best_records(&state.pool, &auth.user_id).await?;
    Ok(Json(json!({ "best": best })))
}

pub async fn get_record(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<PersonalRecord>, AppError> {
    let record = db::get_record(&state.pool, &auth.user_id, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(record))
}

pub async fn create_record(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreatePersonalRecordRequest>,
) -> Result<(StatusCode, Json<PersonalRecord>), AppError> {
    let req = validated(req)?;
    let record = db::create_record(&state.pool, &auth.user_id, &req).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn delete_record(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if !db::delete_record(&state.pool, &auth.user_id, &id).await? {
        return Err(AppError::NotFound);
    }
    Ok(StatusCode::NO_CONTENT)
}
