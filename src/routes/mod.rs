//! # 라우트 핸들러 모듈
//!
//! HTTP 요청을 처리하는 핸들러 함수들을 모아둔 모듈입니다.
//! 헬스체크를 제외한 모든 핸들러는 `AuthUser`를 받아 해당 사용자의 데이터만 다룹니다.
//!
//! 각 하위 모듈:
//! - `dashboard`: 대시보드 요약
//! - `exercises`: 운동 카탈로그 CRUD와 검색
//! - `health`: 서버 상태 확인 (헬스체크)
//! - `live_sessions`: 진행 중인 운동 세션 조작
//! - `measurements`: 신체 측정 CRUD
//! - `profile`: 내 프로필 조회/저장
//! - `records`: 개인 기록
//! - `sessions`: 완료된 운동 세션 이력
//! - `workouts`: 운동 루틴 CRUD

pub mod dashboard;
pub mod exercises;
pub mod health;
pub mod live_sessions;
pub mod measurements;
pub mod profile;
pub mod records;
pub mod sessions;
pub mod workouts;

use crate::config::Config;
use crate::services::live::LiveSessions;
use axum::{
    routing::{get, post},
    Router,
};
use sqlx::SqlitePool;
use std::time::Duration;

/// 애플리케이션 공유 상태
///
/// 모든 요청 핸들러가 `State(state): State<AppState>`로 접근합니다.
/// `SqlitePool`과 `LiveSessions`는 내부가 `Arc`라서 clone해도 같은 자원을 가리킵니다.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Config,
    /// 진행 중인 라이브 세션 목록
    pub live: LiveSessions,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: Config) -> Self {
        let idle_timeout = Duration::from_secs(config.live_session_idle_minutes * 60);
        Self {
            pool,
            config,
            live: LiveSessions::new(idle_timeout),
        }
    }
}

/// `/api/v1` 아래에 붙는 API 라우터
///
/// axum 0.8부터 경로 파라미터는 `/{id}` 형식입니다.
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/profile", get(profile::get_profile).put(profile::upsert_profile))
        // 운동 카탈로그
        .route("/exercises", get(exercises::list_exercises).post(exercises::create_exercise))
        .route("/exercises/search", get(exercises::search_exercises))
        .route(
            "/exercises/{id}",
            get(exercises::get_exercise)
                .patch(exercises::update_exercise)
                .delete(exercises::delete_exercise),
        )
        // 운동 루틴
        .route("/workouts", get(workouts::list_workouts).post(workouts::create_workout))
        .route(
            "/workouts/{id}",
            get(workouts::get_workout)
                .patch(workouts::update_workout)
                .delete(workouts::delete_workout),
        )
        .route("/workouts/{id}/sessions", get(sessions::list_sessions_for_workout))
        // 완료된 세션 이력
        .route("/sessions", get(sessions::list_sessions))
        .route("/sessions/recent", get(sessions::recent_sessions))
        .route(
            "/sessions/{id}",
            get(sessions::get_session)
                .patch(sessions::update_session)
                .delete(sessions::delete_session),
        )
        // 신체 측정
        .route(
            "/measurements",
            get(measurements::list_measurements).post(measurements::create_measurement),
        )
        .route("/measurements/latest", get(measurements::latest_measurements))
        .route(
            "/measurements/{id}",
            get(measurements::get_measurement)
                .patch(measurements::update_measurement)
                .delete(measurements::delete_measurement),
        )
        // 개인 기록
        .route("/records", get(records::list_records).post(records::create_record))
        .route("/records/best", get(records::best_records))
        .route("/records/{id}", get(records::get_record).delete(records::delete_record))
        .route("/dashboard", get(dashboard::dashboard))
        // 라이브 세션
        .route("/live-sessions", post(live_sessions::open_live_session))
        .route(
            "/live-sessions/{id}",
            get(live_sessions::get_live_session).delete(live_sessions::abandon_live_session),
        )
        .route("/live-sessions/{id}/start", post(live_sessions::start_live_session))
        .route("/live-sessions/{id}/pause", post(live_sessions::pause_live_session))
        .route("/live-sessions/{id}/resume", post(live_sessions::resume_live_session))
        .route("/live-sessions/{id}/complete-set", post(live_sessions::complete_set))
        .route("/live-sessions/{id}/finish", post(live_sessions::finish_live_session))
        .with_state(state)
}
