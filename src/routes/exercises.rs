//! # 운동 카탈로그 라우트 핸들러
//!
//! ## 엔드포인트
//! - `GET    /api/v1/exercises?category=strength` → 목록 (최신순)
//! - `POST   /api/v1/exercises`                   → 생성
//! - `GET    /api/v1/exercises/search?q=press`    → 이름/설명/근육 부위 검색 (기본 20건)
//! - `GET    /api/v1/exercises/{id}`              → 단건 조회
//! - `PATCH  /api/v1/exercises/{id}`              → 부분 수정
//! - `DELETE /api/v1/exercises/{id}`              → 삭제

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

/// 검색 결과 기본 개수
const DEFAULT_SEARCH_LIMIT: i64 = 20;

pub async fn list_exercises(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ExerciseListQuery>,
) -> Result<Json<Value>, AppError> {
    let exercises = db::list_exercises(&state.pool, &auth.user_id, query.category).await?;
    Ok(Json(json!({ "exercises": exercises })))
}

pub async fn get_exercise(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Exercise>, AppError> {
    let exercise = db::get_exercise(&state.pool, &auth.user_id, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(exercise))
}

pub async fn create_exercise(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateExerciseRequest>,
) -> Result<(StatusCode, Json<Exercise>), AppError> {
    let req = validated(req)?;
    let exercise = db::create_exercise(&state.pool, &auth.user_id, &req).await?;
    Ok((StatusCode::CREATED, Json(exercise)))
}

pub async fn update_exercise(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateExerciseRequest>,
) -> Result<Json<Exercise>, AppError> {
    let req = validated(req)?;
    let exercise = db::update_exercise(&state.pool, &auth.user_id, &id, &req)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(exercise))
}

pub async fn delete_exercise(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if !db::delete_exercise(&state.pool, &auth.user_id, &id).await? {
        return Err(AppError::NotFound);
    }
    Ok(StatusCode::NO_CONTENT)
}

/// 빈 검색어는 400, `limit`은 1 이상으로 맞춥니다.
pub async fn search_exercises(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ExerciseSearchQuery>,
) -> Result<Json<Value>, AppError> {
    if query.q.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Search query cannot be empty".to_string(),
        ));
    }

    let limit = query.limit.unwrap_or(DEFAULT_SEARCH_LIMIT).max(1) as usize;
    let exercises = db::search_exercises(&state.pool, &auth.user_id, query.q.trim(), limit).await?;
    Ok(Json(json!({ "exercises": exercises })))
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::{call, test_app};
    use axum::http::StatusCode;
    use serde_json::json;

    fn press(name: &str) -> serde_json::Value {
        json!({
            "name": name,
            "category": "strength",
            "muscle_groups": ["chest", "triceps"]
        })
    }

    #[tokio::test]
    async fn create_search_and_delete() {
        let app = test_app().await;
        let (status, created) = call(&app, "POST", "/exercises", "u1", Some(press("Bench Press"))).await;
        assert_eq!(status, StatusCode::CREATED);
        call(&app, "POST", "/exercises", "u1", Some(press("Overhead Press"))).await;

        let (_, found) = call(&app, "GET", "/exercises/search?q=bench", "u1", None).await;
        assert_eq!(found["exercises"].as_array().unwrap().len(), 1);
        let (_, limited) = call(&app, "GET", "/exercises/search?q=press&limit=1", "u1", None).await;
        assert_eq!(limited["exercises"].as_array().unwrap().len(), 1);
        let (status, _) = call(&app, "GET", "/exercises/search?q=%20", "u1", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let uri = format!("/exercises/{}", created["id"].as_str().unwrap());
        let (status, _) = call(&app, "DELETE", &uri, "u2", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = call(&app, "DELETE", &uri, "u1", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn exercise_without_muscle_groups_is_rejected() {
        let app = test_app().await;
        let body = json!({ "name": "Mystery", "category": "cardio", "muscle_groups": [] });
        let (status, _) = call(&app, "POST", "/exercises", "u1", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
