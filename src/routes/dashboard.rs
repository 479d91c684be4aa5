//! # 대시보드 라우트 핸들러
//!
//! ## 엔드포인트
//! - `GET /api/v1/dashboard`
//!
//! ```json
//! {
//!   "weekly_stats": { "total_workouts": 3, "total_duration": 135 },
//!   "recent_records": [...],        // 최근 개인 기록 3개
//!   "latest_measurements": {...},   // 종류별 최신 측정값
//!   "recent_sessions": [...]        // 최근 완료 세션 5개
//! }
//! ```

use crate::{
    db,
    error::AppError,
    middleware::auth::AuthUser,
    routes::{sessions::RECENT_SESSION_COUNT, AppState},
};
use axum::{extract::State, Json};
use chrono::{Duration, Utc};
use serde_json::{json, Value};

/// 주간 통계 집계 구간
const WEEKLY_WINDOW_DAYS: i64 = 7;
const RECENT_RECORD_COUNT: i64 = 3;

pub async fn dashboard(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Value>, AppError> {
    let since = Utc::now() - Duration::days(WEEKLY_WINDOW_DAYS);
    let (total_workouts, total_duration) =
        db::completed_totals_since(&state.pool, &auth.user_id, since).await?;
    let recent_records = db::recent_records(&state.pool, &auth.user_id, RECENT_RECORD_COUNT).await?;
    let latest_measurements = db::latest_measurements(&state.pool, &auth.user_id).await?;
    let recent_sessions =
        db::recent_completed_sessions(&state.pool, &auth.user_id, RECENT_SESSION_COUNT).await?;

    Ok(Json(json!({
        "weekly_stats": {
            "total_workouts": total_workouts,
            "total_duration": total_duration
        },
        "recent_records": recent_records,
        "latest_measurements": latest_measurements,
        "recent_sessions": recent_sessions
    })))
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::{call, test_app};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn empty_dashboard_has_zero_totals() {
        let app = test_app().await;
        let (status, body) = call(&app, "GET", "/dashboard", "u1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["weekly_stats"]["total_workouts"], 0);
        assert_eq!(body["weekly_stats"]["total_duration"], 0);
        assert!(body["recent_records"].as_array().unwrap().is_empty());
    }
}
