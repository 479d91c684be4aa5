//! # SQLite 협력자 구현
//!
//! 세션 상태 머신이 요구하는 세 트레이트를 저장소 함수(`crate::db`) 위에 구현합니다.
//! 한 인스턴스는 한 사용자에게 묶여 있으며, 모든 조회가 그 사용자로 범위가 제한됩니다.

use crate::db;
use crate::error::AppError;
use crate::models::{FinalizedSession, RecordType};
use crate::services::session_runner::{ExerciseCatalog, PersonalRecordChecker, SessionSink};
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
    user_id: String,
}

impl SqliteStore {
    pub fn for_user(pool: SqlitePool, user_id: impl Into<String>) -> Self {
        Self {
            pool,
            user_id: user_id.into(),
        }
    }
}

impl ExerciseCatalog for SqliteStore {
    async fn exercise_name(&self, exercise_id: &str) -> Result<Option<String>, AppError> {
        let exercise = db::get_exercise(&self.pool, &self.user_id, exercise_id).await?;
        Ok(exercise.map(|e| e.name))
    }
}

impl PersonalRecordChecker for SqliteStore {
    async fn check(
        &self,
        user_id: &str,
        exercise_id: &str,
        kind: RecordType,
        value: f64,
        unit: &str,
    ) -> Result<bool, AppError> {
        db::check_and_update_record(&self.pool, user_id, exercise_id, kind, value, unit, None).await
    }
}

impl SessionSink for SqliteStore {
    async fn save(&self, session: &FinalizedSession) -> Result<String, AppError> {
        let id = db::insert_finalized_session(&self.pool, &self.user_id, session).await?;
        tracing::info!(
            "Saved workout session {} ({} min) for user {}",
            id,
            session.duration_minutes,
            self.user_id
        );
        Ok(id)
    }
}
