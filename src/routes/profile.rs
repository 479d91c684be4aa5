//! # 프로필 라우트 핸들러
//!
//! ## 엔드포인트
//! - `GET /api/v1/profile` → 내 프로필 (없으면 404)
//! - `PUT /api/v1/profile` → 내 프로필 생성 또는 덮어쓰기

use crate::{
    db,
    error::AppError,
    middleware::auth::AuthUser,
    models::{schema::validated, *},
    routes::AppState,
};
use axum::{extract::State, Json};

pub async fn get_profile(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<UserProfile>, AppError> {
    let profile = db::get_profile(&state.pool, &auth.user_id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(profile))
}

/// 프로필 ID는 항상 토큰의 사용자 ID입니다. 본문으로 다른 사용자를 지정할 수 없습니다.
pub async fn upsert_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<UpsertProfileRequest>,
) -> Result<Json<UserProfile>, AppError> {
    let req = validated(req)?;
    let profile = db::upsert_profile(&state.pool, &auth.user_id, &req).await?;
    Ok(Json(profile))
}
