//! # 데이터 모델 모듈
//!
//! 애플리케이션에서 사용하는 데이터 구조체(struct)들을 정의합니다.
//! 각 하위 모듈은 특정 도메인의 데이터 타입을 담당합니다:
//! - `exercise`: 운동 카탈로그
//! - `measurement`: 신체 측정
//! - `personal_record`: 개인 기록(PR)
//! - `schema`: 검증 트레이트와 저장소 경계의 디코딩 도우미
//! - `session`: 수행한 운동 세션 기록
//! - `user`: 사용자 프로필
//! - `workout`: 운동 루틴과 운동 처방
//!
//! `pub use X::*;`로 재공개하여 `crate::models::Exercise`처럼 짧게 접근합니다.

pub mod exercise;
pub mod measurement;
pub mod personal_record;
pub mod schema;
pub mod session;
pub mod user;
pub mod workout;

pub use exercise::*;
pub use measurement::*;
pub use personal_record::*;
pub use session::*;
pub use user::*;
pub use workout::*;
