//! # 운동 세션 이력 라우트 핸들러
//!
//! 세션 기록은 라이브 세션의 `finish`로만 만들어집니다. 여기서는 조회, 메모 수정, 삭제만 합니다.
//!
//! ## 엔드포인트 목록
//! | 메서드 | 경로 | 핸들러 | 설명 |
//! |--------|------|--------|------|
//! | GET | /api/v1/sessions?limit=&workout_id= | `list_sessions` | 이력 (시작 시각 최신순) |
//! | GET | /api/v1/sessions/recent | `recent_sessions` | 최근 완료 세션 5개 |
//! | GET | /api/v1/workouts/{id}/sessions | `list_sessions_for_workout` | 루틴별 이력 |
//! | GET | /api/v1/sessions/{id} | `get_session` | 단건 조회 |
//! | PATCH | /api/v1/sessions/{id} | `update_session` | 메모 수정 |
//! | DELETE | /api/v1/sessions/{id} | `delete_session` | 삭제 |

use crate::{
    db,
    error::AppError,
    middleware::auth::AuthUser,
    models::*,
    routes::AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

/// 최근 완료 세션 개수 (대시보드와 같은 값)
pub const RECENT_SESSION_COUNT: i64 = 5;

pub async fn list_sessions(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<SessionListQuery>,
) -> Result<Json<Value>, AppError> {
    let limit = query
        .limit
        .unwrap_or(state.config.session_history_limit)
        .max(1);
    let sessions = db::list_workout_sessions(
        &state.pool,
        &auth.user_id,
        query.workout_id.as_deref(),
        limit,
    )
    .await?;
    Ok(Json(json!({ "sessions": sessions })))
}

pub async fn recent_sessions(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Value>, AppError> {
    let sessions =
        db::recent_completed_sessions(&state.pool, &auth.user_id, RECENT_SESSION_COUNT).await?;
    Ok(Json(json!({ "sessions": sessions })))
}

/// 루틴이 없거나 남의 것이면 빈 목록 대신 404를 돌려줍니다.
pub async fn list_sessions_for_workout(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(workout_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let _ = db::get_workout(&state.pool, &auth.user_id, &workout_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let sessions = db::list_workout_sessions(
        &state.pool,
        &auth.user_id,
        Some(&workout_id),
        state.config.session_history_limit,
    )
    .await?;
    Ok(Json(json!({ "sessions": sessions })))
}

pub async fn get_session(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<WorkoutSessionRecord>, AppError> {
    let session = db::get_workout_session(&state.pool, &auth.user_id, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(session))
}

pub async fn update_session(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateSessionRequest>,
) -> Result<Json<WorkoutSessionRecord>, AppError> {
    let session = db::update_session_notes(&state.pool, &auth.user_id, &id, req.notes.as_deref())
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(session))
}

pub async fn delete_session(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if !db::delete_workout_session(&state.pool, &auth.user_id, &id).await? {
        return Err(AppError::NotFound);
    }
    Ok(StatusCode::NO_CONTENT)
}
