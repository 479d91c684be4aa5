//! # 서비스 계층
//!
//! HTTP와 무관한 도메인 로직을 담습니다.
//! - `session_runner`: 운동 세션 상태 머신과 협력자 트레이트
//! - `live`: 세션마다 하나씩 도는 tokio 태스크와 그 목록
//! - `store`: 협력자 트레이트의 SQLite 구현

pub mod live;
pub mod session_runner;
pub mod store;
