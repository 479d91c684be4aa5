//! # 에러 처리 모듈
//!
//! 애플리케이션에서 발생할 수 있는 모든 에러 타입을 정의합니다.
//! Rust에서는 예외(exception) 대신 `Result<T, E>` 타입으로 에러를 처리합니다.
//!
//! 이 모듈의 핵심:
//! - `AppError` 열거형(enum): 모든 에러 종류를 하나의 타입으로 통합
//! - `IntoResponse` 구현: 에러를 HTTP 응답으로 자동 변환
//! - `From<SessionError>`: 운동 세션 상태 머신의 거부를 HTTP 409로 연결

use crate::services::session_runner::SessionError;
use axum::{
    http::StatusCode,                   // HTTP 상태 코드 (200, 404, 500 등)
    response::{IntoResponse, Response}, // Axum의 응답 변환 트레이트
    Json,                               // JSON 응답 래퍼
};
use serde_json::json; // json! 매크로: JSON 객체를 간편하게 생성
use thiserror::Error; // thiserror: 커스텀 에러 타입을 쉽게 만들어주는 매크로 크레이트

/// 애플리케이션에서 발생할 수 있는 모든 에러 종류
///
/// 각 에러 variant는 적절한 HTTP 상태 코드와 메시지로 변환됩니다.
/// 핸들러에서 `Result<T, AppError>`를 반환하면,
/// Axum이 자동으로 `IntoResponse`를 호출하여 HTTP 응답으로 변환합니다.
#[derive(Debug, Error)]
pub enum AppError {
    /// 요청한 리소스를 찾을 수 없음 (HTTP 404)
    ///
    /// 다른 사용자의 리소스를 조회한 경우에도 존재 여부를 드러내지 않도록 404를 씁니다.
    #[error("Resource not found")]
    NotFound,

    /// 잘못된 요청 (HTTP 400)
    /// 스키마 검증 실패 메시지를 그대로 담아 클라이언트에 돌려줍니다.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// 서버 내부 오류 (HTTP 500)
    /// 저장된 레코드의 형식이 깨져 디코딩에 실패한 경우도 여기에 해당합니다.
    #[error("Internal error: {0}")]
    Internal(String),

    /// 데이터베이스 오류 (HTTP 500)
    /// #[from]: sqlx::Error → AppError::Database 자동 변환 (`?` 연산자와 함께 사용)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// 현재 상태에서 허용되지 않는 세션 조작 (HTTP 409)
    /// 예: 시작하지 않은 세션에서 세트 완료, 일시정지 중 세트 완료
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl From<SessionError> for AppError {
    /// 상태 머신 거부는 409로, 저장소(sink) 실패는 원래 에러를 그대로 전달합니다.
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Persistence(inner) => inner,
            rejected @ (SessionError::InvalidDefinition(_) | SessionError::InvalidEntry(_)) => {
                AppError::BadRequest(rejected.to_string())
            }
            other => AppError::InvalidState(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    /// AppError를 HTTP 응답으로 변환합니다.
    ///
    /// 내부 에러(Database, Internal)는 실제 에러 내용을 로그에만 기록하고,
    /// 클라이언트에는 일반적인 메시지만 반환합니다.
    fn into_response(self) -> Response {
        // (status, code, message) 튜플을 반환합니다.
        let (status, code, message) = match self {
            AppError::NotFound => (StatusCode::NOT_FOUND, "not_found", self.to_string()),
            AppError::BadRequest(ref msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", msg.clone())
            }
            AppError::Internal(ref msg) => {
                // 내부 에러는 로그에 기록 (서버 관리자용)
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
            AppError::Database(ref e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database_error",
                    "A database error occurred".to_string(),
                )
            }
            AppError::InvalidState(ref msg) => {
                (StatusCode::CONFLICT, "invalid_state", msg.clone())
            }
        };

        // 결과: { "error": { "code": "not_found", "message": "Resource not found" } }
        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
