//! # 미들웨어 모듈
//!
//! - `auth`: Bearer 액세스 토큰 검증과 `AuthUser` 추출기

pub mod auth;
