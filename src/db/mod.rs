//! # 데이터베이스 접근 계층 (Data Access Layer)
//!
//! 데이터베이스와 직접 상호작용하는 함수들을 모아둔 모듈입니다.
//! 라우트 핸들러(routes/)와 세션 서비스(services/)가 이 모듈을 호출합니다.
//!
//! ## 쿼리 범위 규칙
//! 모든 엔티티 함수는 `pool` 다음 인자로 소유자 `user_id`를 받고,
//! 모든 SQL에 `WHERE user_id = ?` 조건을 붙입니다.
//! 다른 사용자의 행은 "존재하지 않는 것"과 똑같이 취급됩니다.
//!
//! 각 하위 모듈:
//! - `exercises`: 운동 카탈로그 CRUD와 검색
//! - `measurements`: 신체 측정 CRUD
//! - `personal_records`: 개인 기록 조회와 갱신 판정
//! - `profiles`: 사용자 프로필 조회/upsert
//! - `sessions`: 완료된 운동 세션 기록
//! - `workouts`: 운동 루틴 CRUD

pub mod exercises;
pub mod measurements;
pub mod personal_records;
pub mod profiles;
pub mod sessions;
pub mod workouts;

pub use exercises::*;
pub use measurements::*;
pub use personal_records::*;
pub use profiles::*;
pub use sessions::*;
pub use workouts::*;

/// 테스트용 인메모리 DB를 만들고 마이그레이션을 적용합니다.
///
/// `sqlite::memory:`는 연결마다 별개의 DB가 되므로 연결 수를 1로 고정합니다.
#[cfg(test)]
pub async fn test_pool() -> sqlx::SqlitePool {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    pool
}
