//! # 운동 세션 모델 정의
//!
//! 실제로 수행한 운동 기록을 표현하는 구조체들입니다.
//!
//! ## 세션 흐름
//! 1. 루틴(Workout)을 골라 라이브 세션을 만든다 (`services::live`)
//! 2. 세트를 하나씩 완료하며 `SessionSet.completed`가 채워진다
//! 3. 세션을 마치면 `FinalizedSession`이 만들어져 `workout_sessions`에 저장된다
//!
//! `SessionExercise`/`SessionSet`은 라이브 세션 상태 머신과 저장된 기록이
//! 같은 타입을 공유합니다.

use super::schema::{decode_json_column, decode_stored, require_non_empty, require_non_negative, Validate};
use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 한 세트의 기록
///
/// 세션 시작 시 처방값으로 채워진 채 `completed = false`로 만들어지고,
/// 세트 완료 시 한 번만 `completed = true`가 됩니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSet {
    pub reps: Option<u32>,
    pub weight: Option<f64>,
    /// 이 세트 뒤의 휴식 시간(초)
    pub rest_time: Option<u32>,
    pub completed: bool,
}

/// 한 운동의 세트 기록 묶음
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionExercise {
    pub exercise_id: String,
    pub sets: Vec<SessionSet>,
    #[serde(default)]
    pub notes: String,
}

impl Validate for SessionExercise {
    fn validate(&self) -> Result<(), String> {
        require_non_empty("exercise_id", &self.exercise_id)?;
        for set in &self.sets {
            if set.reps == Some(0) {
                return Err(format!("{}: reps must be at least 1", self.exercise_id));
            }
            if let Some(weight) = set.weight {
                require_non_negative("weight", weight)?;
            }
        }
        Ok(())
    }
}

/// 세션 종료 시 한 번 만들어지는 최종 기록
///
/// 만들어진 뒤에는 바뀌지 않으며, 세션 저장소(`SessionSink`)에 그대로 넘겨집니다.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalizedSession {
    pub workout_id: String,
    pub name: String,
    pub exercises: Vec<SessionExercise>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// round((end - start) / 1분)
    pub duration_minutes: i64,
    pub paused_seconds: i64,
    pub completed: bool,
}

#[derive(Debug, sqlx::FromRow)]
pub struct WorkoutSessionRow {
    pub id: String,
    pub user_id: String,
    pub workout_id: Option<String>,
    pub name: String,
    pub exercises: String,
    pub start_time: String,
    pub end_time: Option<String>,
    pub duration: Option<i64>,
    pub paused_seconds: i64,
    pub notes: Option<String>,
    pub completed: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// 저장된 운동 세션: `workout_sessions` 테이블 한 행에 대응합니다.
#[derive(Debug, Clone, Serialize)]
pub struct WorkoutSessionRecord {
    pub id: String,
    pub user_id: String,
    pub workout_id: Option<String>,
    pub name: String,
    pub exercises: Vec<SessionExercise>,
    pub start_time: String,
    pub end_time: Option<String>,
    /// 시작~종료 벽시계 시간(분, 반올림). 일시정지 시간도 포함됩니다.
    pub duration: Option<i64>,
    /// 일시정지 상태로 보낸 시간(초). 순수 운동 시간 = duration*60 - paused_seconds
    pub paused_seconds: i64,
    pub notes: Option<String>,
    pub completed: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<WorkoutSessionRow> for WorkoutSessionRecord {
    type Error = AppError;

    fn try_from(row: WorkoutSessionRow) -> Result<Self, Self::Error> {
        let record = WorkoutSessionRecord {
            exercises: decode_json_column("workout_sessions", "exercises", &row.id, &row.exercises)?,
            id: row.id,
            user_id: row.user_id,
            workout_id: row.workout_id,
            name: row.name,
            start_time: row.start_time,
            end_time: row.end_time,
            duration: row.duration,
            paused_seconds: row.paused_seconds,
            notes: row.notes,
            completed: row.completed,
            created_at: row.created_at,
            updated_at: row.updated_at,
        };
        let id = record.id.clone();
        decode_stored("workout_sessions", &id, record)
    }
}

impl Validate for WorkoutSessionRecord {
    fn validate(&self) -> Result<(), String> {
        require_non_empty("name", &self.name)?;
        if matches!(self.duration, Some(d) if d < 0) || self.paused_seconds < 0 {
            return Err("durations must be non-negative".to_string());
        }
        self.exercises.iter().try_for_each(Validate::validate)
    }
}

/// 저장된 세션 메모 수정: `PATCH /api/v1/sessions/{id}`
#[derive(Debug, Deserialize)]
pub struct UpdateSessionRequest {
    pub notes: Option<String>,
}

/// `GET /api/v1/sessions?limit=20&workout_id=...`
#[derive(Debug, Deserialize)]
pub struct SessionListQuery {
    pub limit: Option<i64>,
    pub workout_id: Option<String>,
}
