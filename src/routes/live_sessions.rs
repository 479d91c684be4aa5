//! # 라이브 세션 라우트 핸들러
//!
//! 저장된 루틴으로 세션을 열고, 세트를 하나씩 진행한 뒤 종료하면 세션 이력에 저장됩니다.
//!
//! ## 엔드포인트 목록
//! | 메서드 | 경로 | 설명 |
//! |--------|------|------|
//! | POST | /api/v1/live-sessions | `{ "workout_id" }`로 세션 열기 (NotStarted) |
//! | GET | /api/v1/live-sessions/{id} | 현재 상태 (커서, 세트, 휴식, 기록 알림) |
//! | POST | /api/v1/live-sessions/{id}/start | 시작 |
//! | POST | /api/v1/live-sessions/{id}/pause | 일시정지 |
//! | POST | /api/v1/live-sessions/{id}/resume | 재개 |
//! | POST | /api/v1/live-sessions/{id}/complete-set | 현재 세트 완료 (`{ "reps", "weight" }` 선택) |
//! | POST | /api/v1/live-sessions/{id}/finish | 종료 및 저장 |
//! | DELETE | /api/v1/live-sessions/{id} | 기록 없이 버리기 |
//!
//! 현재 상태에서 할 수 없는 조작은 409 `invalid_state`로 거부됩니다.

use crate::{
    db,
    error::AppError,
    middleware::auth::AuthUser,
    models::WorkoutSessionRecord,
    routes::AppState,
    services::{
        live::{LiveSessionHandle, LiveSessionView, SetOutcome},
        session_runner::{SetEntry, WorkoutDefinition},
        store::SqliteStore,
    },
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub struct OpenLiveSessionRequest {
    pub workout_id: String,
}

async fn handle_for(
    state: &AppState,
    auth: &AuthUser,
    id: &str,
) -> Result<LiveSessionHandle, AppError> {
    state
        .live
        .get(&auth.user_id, id)
        .await
        .ok_or(AppError::NotFound)
}

pub async fn open_live_session(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<OpenLiveSessionRequest>,
) -> Result<(StatusCode, Json<LiveSessionView>), AppError> {
    let workout = db::get_workout(&state.pool, &auth.user_id, &req.workout_id)
        .await?
        .ok_or(AppError::NotFound)?;
    let definition = WorkoutDefinition::try_from(&workout)?;

    let handle = state
        .live
        .open(
            &auth.user_id,
            definition,
            SqliteStore::for_user(state.pool.clone(), &auth.user_id),
            &state.config.weight_unit,
            Duration::from_millis(state.config.rest_tick_millis),
        )
        .await;
    tracing::info!("Live session {} opened for workout {}", handle.id(), workout.id);
    Ok((StatusCode::CREATED, Json(handle.snapshot().await?)))
}

pub async fn get_live_session(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<LiveSessionView>, AppError> {
    let handle = handle_for(&state, &auth, &id).await?;
    Ok(Json(handle.snapshot().await?))
}

pub async fn start_live_session(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<LiveSessionView>, AppError> {
    let handle = handle_for(&state, &auth, &id).await?;
    Ok(Json(handle.start().await?))
}

pub async fn pause_live_session(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<LiveSessionView>, AppError> {
    let handle = handle_for(&state, &auth, &id).await?;
    Ok(Json(handle.pause().await?))
}

pub async fn resume_live_session(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<LiveSessionView>, AppError> {
    let handle = handle_for(&state, &auth, &id).await?;
    Ok(Json(handle.resume().await?))
}

/// 본문이 없으면 처방값 그대로 완료합니다.
pub async fn complete_set(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    entry: Option<Json<SetEntry>>,
) -> Result<Json<SetOutcome>, AppError> {
    let handle = handle_for(&state, &auth, &id).await?;
    let entry = entry.map(|Json(entry)| entry).unwrap_or_default();
    Ok(Json(handle.complete_set(entry).await?))
}

/// 저장된 세션 기록을 돌려줍니다. 저장에 실패하면 라이브 세션은 그대로 남아 다시 시도할 수 있습니다.
pub async fn finish_live_session(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<WorkoutSessionRecord>), AppError> {
    let handle = handle_for(&state, &auth, &id).await?;
    let session_id = handle.finish().await?;
    state.live.remove(&auth.user_id, &id).await;

    let session = db::get_workout_session(&state.pool, &auth.user_id, &session_id)
        .await?
        .ok_or(AppError::Internal(format!(
            "finished session {} is missing",
            session_id
        )))?;
    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn abandon_live_session(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let handle = state
        .live
        .remove(&auth.user_id, &id)
        .await
        .ok_or(AppError::NotFound)?;
    handle.abandon().await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::{call, test_app};
    use axum::http::StatusCode;
    use serde_json::{json, Value};

    async fn open_squat_session(app: &axum::Router) -> String {
        let workout = json!({
            "name": "Squat Day",
            "exercises": [{ "exercise_id": "squat", "sets": 3, "reps": 10, "weight": 20.0, "rest_time": 30 }],
            "estimated_duration": 30,
            "difficulty": "beginner",
            "color": "#F59E0B"
        });
        let (_, workout) = call(app, "POST", "/workouts", "u1", Some(workout)).await;
        let (status, live) = call(
            app,
            "POST",
            "/live-sessions",
            "u1",
            Some(json!({ "workout_id": workout["id"] })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(live["status"], "not_started");
        live["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn full_session_is_saved_to_history() {
        let app = test_app().await;
        let id = open_squat_session(&app).await;
        let base = format!("/live-sessions/{}", id);

        let (status, _) = call(&app, "POST", &format!("{}/start", base), "u1", None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, first) = call(
            &app,
            "POST",
            &format!("{}/complete-set", base),
            "u1",
            Some(json!({ "reps": 10, "weight": 20.0 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["completion"]["rest"]["remaining_seconds"], 30);
        assert_eq!(first["session"]["cursor"]["set_index"], 1);

        for _ in 0..2 {
            let (status, _) = call(&app, "POST", &format!("{}/complete-set", base), "u1", None).await;
            assert_eq!(status, StatusCode::OK);
        }
        let (status, error) = call(&app, "POST", &format!("{}/complete-set", base), "u1", None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(error["error"]["code"], "invalid_state");

        let (status, saved) = call(&app, "POST", &format!("{}/finish", base), "u1", None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(saved["completed"], true);
        assert_eq!(saved["duration"], 0);

        let (status, _) = call(&app, "GET", &base, "u1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (_, history) = call(&app, "GET", "/sessions", "u1", None).await;
        assert_eq!(history["sessions"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn paused_session_rejects_set_completion() {
        let app = test_app().await;
        let id = open_squat_session(&app).await;
        let base = format!("/live-sessions/{}", id);

        let (status, _) = call(&app, "POST", &format!("{}/finish", base), "u1", None).await;
        assert_eq!(status, StatusCode::CONFLICT);

        call(&app, "POST", &format!("{}/start", base), "u1", None).await;
        let (_, paused) = call(&app, "POST", &format!("{}/pause", base), "u1", None).await;
        assert_eq!(paused["status"], "paused");

        let (status, _) = call(&app, "POST", &format!("{}/complete-set", base), "u1", None).await;
        assert_eq!(status, StatusCode::CONFLICT);

        call(&app, "POST", &format!("{}/resume", base), "u1", None).await;
        let (status, _) = call(&app, "POST", &format!("{}/complete-set", base), "u1", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn other_users_cannot_touch_the_session_and_abandon_leaves_no_record() {
        let app = test_app().await;
        let id = open_squat_session(&app).await;
        let base = format!("/live-sessions/{}", id);

        let (status, _) = call(&app, "GET", &base, "u2", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = call(&app, "DELETE", &base, "u2", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        call(&app, "POST", &format!("{}/start", base), "u1", None).await;
        let (status, _) = call(&app, "DELETE", &base, "u1", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, history): (_, Value) = call(&app, "GET", "/sessions", "u1", None).await;
        assert!(history["sessions"].as_array().unwrap().is_empty());
    }
}
