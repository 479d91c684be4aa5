//! # 운동 루틴 라우트 핸들러
//!
//! ## 엔드포인트
//! - `GET    /api/v1/workouts?difficulty=beginner` → 목록 (최신순)
//! - `POST   /api/v1/workouts`                     → 생성
//! - `GET    /api/v1/workouts/{id}`                → 단건 조회
//! - `PATCH  /api/v1/workouts/{id}`                → 부분 수정
//! - `DELETE /api/v1/workouts/{id}`                → 삭제 (이미 저장된 세션 기록은 남습니다)

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

pub async fn list_workouts(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<WorkoutListQuery>,
) -> Result<Json<Value>, AppError> {
    let workouts = db::list_workouts(&state.pool, &auth.user_id, query.difficulty).await?;
    Ok(Json(json!({ "workouts": workouts })))
}

pub async fn get_workout(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Workout>, AppError> {
    let workout = db::get_workout(&state.pool, &auth.user_id, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(workout))
}

pub async fn create_workout(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateWorkoutRequest>,
) -> Result<(StatusCode, Json<Workout>), AppError> {
    let req = validated(req)?;
    let workout = db::create_workout(&state.pool, &auth.user_id, &req).await?;
    Ok((StatusCode::CREATED, Json(workout)))
}

pub async fn update_workout(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateWorkoutRequest>,
) -> Result<Json<Workout>, AppError> {
    let req = validated(req)?;
    let workout = db::update_workout(&state.pool, &auth.user_id, &id, &req)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(workout))
}

pub async fn delete_workout(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if !db::delete_workout(&state.pool, &auth.user_id, &id).await? {
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
    async fn workouts_are_private_to_their_owner() {
        let app = test_app().await;
        let body = json!({
            "name": "Pull Day",
            "exercises": [{ "exercise_id": "row", "sets": 3, "reps": 10, "weight": 50.0, "rest_time": 60 }],
            "estimated_duration": 45,
            "difficulty": "beginner",
            "color": "#10B981"
        });
        let (status, created) = call(&app, "POST", "/workouts", "u1", Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);

        let uri = format!("/workouts/{}", created["id"].as_str().unwrap());
        let (status, _) = call(&app, "GET", &uri, "u2", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, updated) = call(&app, "PATCH", &uri, "u1", Some(json!({ "name": "Back Day" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["name"], "Back Day");

        let (_, listed) = call(&app, "GET", "/workouts?difficulty=advanced", "u1", None).await;
        assert!(listed["workouts"].as_array().unwrap().is_empty());
    }
}
