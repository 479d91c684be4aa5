//! # 헬스체크(Health Check) 핸들러
//!
//! ## 엔드포인트
//! - `GET /api/v1/health` → `{ "status": "ok", "database": "ok", "live_sessions": 0 }`
//!
//! 인증 없이 호출할 수 있습니다.

use crate::{error::AppError, routes::AppState};
use axum::{extract::State, Json};
use serde_json::{json, Value};

/// `GET /health`: 서버와 DB 연결 상태, 진행 중인 라이브 세션 수를 돌려줍니다.
///
/// DB에 닿지 못하면 500 응답이 됩니다.
pub async fn health_check(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    sqlx::query("SELECT 1").execute(&state.pool).await?;

    Ok(Json(json!({
        "status": "ok",
        "database": "ok",
        "live_sessions": state.live.count().await
    })))
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::test_app;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn health_needs_no_token() {
        let app = test_app().await;
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
