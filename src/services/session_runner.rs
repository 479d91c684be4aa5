//! # 운동 세션 상태 머신 (WorkoutSessionRunner)
//!
//! 루틴 하나를 처음부터 끝까지 진행시키는 순수한 상태 머신입니다.
//! 시간은 항상 `now` 인자로 주입받으므로 테스트에서 시계를 마음대로 움직일 수 있습니다.
//!
//! ## 상태 전이
//! ```text
//! NotStarted ──start()──▶ Active ◀──resume()── Paused
//!                           │  └────pause()────▶  │
//!                           └──────finish()───────┴──▶ Completed
//! ```
//! 허용되지 않는 상태에서의 호출은 항상 `SessionError`로 거부되며 상태를 바꾸지 않습니다.
//!
//! ## 외부 협력자
//! - `ExerciseCatalog`: 운동 이름 조회 (알림 표시용)
//! - `PersonalRecordChecker`: 새 개인 기록인지 판정하고, 그렇다면 저장
//! - `SessionSink`: 종료된 세션을 저장하고 ID를 돌려줌
//!
//! 상태 머신 자체는 `SessionSink`만 직접 호출합니다(`finish`).
//! 기록 판정은 `complete_current_set`이 돌려주는 `RecordCandidate`를 보고
//! 호출자(`services::live`)가 따로 수행합니다.

use crate::error::AppError;
use crate::models::schema::{require_non_negative, Validate};
use crate::models::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use thiserror::Error;

/// 운동 이름 조회
pub trait ExerciseCatalog {
    fn exercise_name(
        &self,
        exercise_id: &str,
    ) -> impl Future<Output = Result<Option<String>, AppError>> + Send;
}

/// 개인 기록 판정기
///
/// `Ok(true)`이면 새 기록이며 이미 저장까지 끝난 상태입니다.
/// 같거나 작은 값으로 다시 호출하면 `Ok(false)`를 돌려줘야 합니다.
pub trait PersonalRecordChecker {
    fn check(
        &self,
        user_id: &str,
        exercise_id: &str,
        kind: RecordType,
        value: f64,
        unit: &str,
    ) -> impl Future<Output = Result<bool, AppError>> + Send;
}

/// 종료된 세션의 저장소. 세션 하나당 성공하는 호출은 정확히 한 번입니다.
pub trait SessionSink {
    fn save(
        &self,
        session: &FinalizedSession,
    ) -> impl Future<Output = Result<String, AppError>> + Send;
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session has not been started")]
    NotStarted,

    #[error("session has already been started")]
    AlreadyStarted,

    #[error("session is not active")]
    NotActive,

    #[error("session is not paused")]
    NotPaused,

    #[error("session is already completed")]
    AlreadyCompleted,

    /// 마지막 운동의 마지막 세트까지 이미 완료됨. 남은 일은 `finish()`뿐입니다.
    #[error("every set has already been completed")]
    NoRemainingSets,

    #[error("invalid workout: {0}")]
    InvalidDefinition(String),

    #[error("invalid set entry: {0}")]
    InvalidEntry(String),

    /// 세션 저장 실패. 상태는 Active/Paused 그대로이므로 `finish()`를 다시 시도할 수 있습니다.
    #[error("session could not be saved: {0}")]
    Persistence(#[source] AppError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    NotStarted,
    Active,
    Paused,
    Completed,
}

/// 현재 진행 중인 (운동, 세트) 위치. 앞으로만 움직입니다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionCursor {
    pub exercise_index: usize,
    pub set_index: usize,
}

/// 세트 사이 휴식 카운트다운 (표시용, 진행을 막지 않음)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RestCountdown {
    pub total_seconds: u32,
    pub remaining_seconds: u32,
}

/// 세션의 입력이 되는 루틴. 세션 도중에는 바뀌지 않습니다.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkoutDefinition {
    pub workout_id: String,
    pub name: String,
    pub exercises: Vec<ExercisePrescription>,
}

impl WorkoutDefinition {
    pub fn new(
        workout_id: impl Into<String>,
        name: impl Into<String>,
        exercises: Vec<ExercisePrescription>,
    ) -> Result<Self, SessionError> {
        if exercises.is_empty() {
            return Err(SessionError::InvalidDefinition(
                "a workout needs at least one exercise".to_string(),
            ));
        }
        exercises
            .iter()
            .try_for_each(Validate::validate)
            .map_err(SessionError::InvalidDefinition)?;

        Ok(Self {
            workout_id: workout_id.into(),
            name: name.into(),
            exercises,
        })
    }
}

impl TryFrom<&Workout> for WorkoutDefinition {
    type Error = SessionError;

    fn try_from(workout: &Workout) -> Result<Self, Self::Error> {
        WorkoutDefinition::new(&workout.id, &workout.name, workout.exercises.clone())
    }
}

/// 세트 완료 시 실제로 수행한 값. 비워 두면 처방값이 그대로 기록됩니다.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct SetEntry {
    pub reps: Option<u32>,
    pub weight: Option<f64>,
}

impl Validate for SetEntry {
    fn validate(&self) -> Result<(), String> {
        if self.reps == Some(0) {
            return Err("reps must be at least 1".to_string());
        }
        if let Some(weight) = self.weight {
            require_non_negative("weight", weight)?;
        }
        Ok(())
    }
}

/// 개인 기록 판정이 필요한 세트 완료
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordCandidate {
    pub exercise_id: String,
    pub kind: RecordType,
    pub value: f64,
}

/// `complete_current_set`의 결과
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SetCompletion {
    pub exercise_index: usize,
    pub set_index: usize,
    pub set: SessionSet,
    pub record_candidate: Option<RecordCandidate>,
    pub rest: Option<RestCountdown>,
    pub cursor: SessionCursor,
    /// 마지막 운동의 마지막 세트였는지
    pub was_final_set: bool,
}

/// 외부에 보여주는 세션 상태
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub workout_id: String,
    pub name: String,
    pub status: SessionStatus,
    pub cursor: SessionCursor,
    pub exercises: Vec<SessionExercise>,
    pub rest: Option<RestCountdown>,
    pub started_at: Option<DateTime<Utc>>,
    pub paused_seconds: i64,
    pub session_id: Option<String>,
}

#[derive(Debug)]
pub struct WorkoutSessionRunner {
    definition: WorkoutDefinition,
    status: SessionStatus,
    exercises: Vec<SessionExercise>,
    cursor: SessionCursor,
    rest: Option<RestCountdown>,
    started_at: Option<DateTime<Utc>>,
    paused_at: Option<DateTime<Utc>>,
    /// 끝난 일시정지들의 합. 초 단위 반올림은 보고할 때 한 번만 합니다.
    paused_millis: i64,
    session_id: Option<String>,
}

impl WorkoutSessionRunner {
    pub fn new(definition: WorkoutDefinition) -> Self {
        Self {
            definition,
            status: SessionStatus::NotStarted,
            exercises: Vec::new(),
            cursor: SessionCursor::default(),
            rest: None,
            started_at: None,
            paused_at: None,
            paused_millis: 0,
            session_id: None,
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn cursor(&self) -> SessionCursor {
        self.cursor
    }

    pub fn rest(&self) -> Option<RestCountdown> {
        self.rest
    }

    pub fn exercises(&self) -> &[SessionExercise] {
        &self.exercises
    }

    /// 저장에 성공한 뒤에만 `Some`
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            workout_id: self.definition.workout_id.clone(),
            name: self.definition.name.clone(),
            status: self.status,
            cursor: self.cursor,
            exercises: self.exercises.clone(),
            rest: self.rest,
            started_at: self.started_at,
            paused_seconds: rounded_seconds(self.paused_millis),
            session_id: self.session_id.clone(),
        }
    }

    /// 세션을 시작합니다. 처방마다 세트 수만큼 미완료 세트를 만들고 커서를 (0, 0)에 둡니다.
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<(), SessionError> {
        match self.status {
            SessionStatus::NotStarted => {}
            SessionStatus::Completed => return Err(SessionError::AlreadyCompleted),
            SessionStatus::Active | SessionStatus::Paused => {
                return Err(SessionError::AlreadyStarted)
            }
        }

        self.exercises = self
            .definition
            .exercises
            .iter()
            .map(|prescription| SessionExercise {
                exercise_id: prescription.exercise_id.clone(),
                sets: (0..prescription.sets)
                    .map(|_| SessionSet {
                        reps: prescription.reps,
                        weight: prescription.weight,
                        rest_time: Some(prescription.rest_time),
                        completed: false,
                    })
                    .collect(),
                notes: String::new(),
            })
            .collect();
        self.cursor = SessionCursor::default();
        self.started_at = Some(now);
        self.status = SessionStatus::Active;
        Ok(())
    }

    /// 일시정지. 커서와 휴식 카운트다운에는 영향을 주지 않습니다.
    pub fn pause(&mut self, now: DateTime<Utc>) -> Result<(), SessionError> {
        match self.status {
            SessionStatus::Active => {}
            SessionStatus::NotStarted => return Err(SessionError::NotStarted),
            SessionStatus::Paused => return Err(SessionError::NotActive),
            SessionStatus::Completed => return Err(SessionError::AlreadyCompleted),
        }
        self.paused_at = Some(now);
        self.status = SessionStatus::Paused;
        Ok(())
    }

    pub fn resume(&mut self, now: DateTime<Utc>) -> Result<(), SessionError> {
        match self.status {
            SessionStatus::Paused => {}
            SessionStatus::NotStarted => return Err(SessionError::NotStarted),
            SessionStatus::Active => return Err(SessionError::NotPaused),
            SessionStatus::Completed => return Err(SessionError::AlreadyCompleted),
        }
        self.paused_millis += self.pause_in_progress(now);
        self.paused_at = None;
        self.status = SessionStatus::Active;
        Ok(())
    }

    /// 커서 위치의 세트를 완료 처리하고 커서를 다음 세트로 옮깁니다.
    ///
    /// - 무게와 횟수가 모두 0보다 크면 `maxWeight` 기록 후보를 돌려줍니다.
    /// - 운동의 마지막 세트가 아니면 휴식 카운트다운을 새로 시작합니다(기존 것은 교체).
    /// - 마지막 운동의 마지막 세트 뒤에는 커서가 더 움직이지 않습니다.
    pub fn complete_current_set(&mut self, entry: SetEntry) -> Result<SetCompletion, SessionError> {
        match self.status {
            SessionStatus::Active => {}
            SessionStatus::NotStarted => return Err(SessionError::NotStarted),
            SessionStatus::Paused => return Err(SessionError::NotActive),
            SessionStatus::Completed => return Err(SessionError::AlreadyCompleted),
        }
        entry.validate().map_err(SessionError::InvalidEntry)?;

        let SessionCursor {
            exercise_index,
            set_index,
        } = self.cursor;
        let prescription = &self.definition.exercises[exercise_index];
        let set_count = self.exercises[exercise_index].sets.len();
        let exercise_count = self.exercises.len();

        let set = &mut self.exercises[exercise_index].sets[set_index];
        if set.completed {
            return Err(SessionError::NoRemainingSets);
        }
        if entry.reps.is_some() {
            set.reps = entry.reps;
        }
        if entry.weight.is_some() {
            set.weight = entry.weight;
        }
        set.completed = true;
        let set = set.clone();

        let record_candidate = match (set.weight, set.reps) {
            (Some(weight), Some(reps)) if weight > 0.0 && reps > 0 => Some(RecordCandidate {
                exercise_id: prescription.exercise_id.clone(),
                kind: RecordType::MaxWeight,
                value: weight,
            }),
            _ => None,
        };

        let is_last_set_of_exercise = set_index + 1 >= set_count;
        if !is_last_set_of_exercise {
            self.rest = (prescription.rest_time > 0).then_some(RestCountdown {
                total_seconds: prescription.rest_time,
                remaining_seconds: prescription.rest_time,
            });
        }

        let was_final_set = is_last_set_of_exercise && exercise_index + 1 >= exercise_count;
        if !is_last_set_of_exercise {
            self.cursor.set_index += 1;
        } else if !was_final_set {
            self.cursor = SessionCursor {
                exercise_index: exercise_index + 1,
                set_index: 0,
            };
        }

        Ok(SetCompletion {
            exercise_index,
            set_index,
            set,
            record_candidate,
            rest: self.rest,
            cursor: self.cursor,
            was_final_set,
        })
    }

    /// 휴식 카운트다운을 1초 진행시킵니다. 0에 도달하는 틱에서 카운트다운이 사라집니다.
    pub fn tick(&mut self) -> Option<RestCountdown> {
        let countdown = self.rest.as_mut()?;
        if countdown.remaining_seconds <= 1 {
            self.rest = None;
        } else {
            countdown.remaining_seconds -= 1;
        }
        self.rest
    }

    /// 저장할 최종 기록을 만듭니다. 상태는 바꾸지 않습니다.
    ///
    /// 소요 시간은 시작~종료 벽시계 시간을 분 단위로 반올림한 값이며 일시정지 시간도 포함됩니다.
    /// 일시정지 시간 자체는 `paused_seconds`로 따로 보고됩니다.
    pub fn finalize(&self, now: DateTime<Utc>) -> Result<FinalizedSession, SessionError> {
        let start_time = match (self.status, self.started_at) {
            (SessionStatus::Active | SessionStatus::Paused, Some(started_at)) => started_at,
            (SessionStatus::Completed, _) => return Err(SessionError::AlreadyCompleted),
            _ => return Err(SessionError::NotStarted),
        };

        let elapsed_millis = (now - start_time).num_milliseconds().max(0);
        let duration_minutes = (elapsed_millis as f64 / 60_000.0).round() as i64;

        Ok(FinalizedSession {
            workout_id: self.definition.workout_id.clone(),
            name: self.definition.name.clone(),
            exercises: self.exercises.clone(),
            start_time,
            end_time: now,
            duration_minutes,
            paused_seconds: rounded_seconds(self.paused_millis + self.pause_in_progress(now)),
            completed: true,
        })
    }

    /// 세션을 끝내고 저장합니다.
    ///
    /// 저장에 성공해야만 `Completed`가 됩니다. 실패하면 상태는 그대로이고
    /// 에러가 호출자에게 돌아갑니다.
    pub async fn finish<S: SessionSink>(
        &mut self,
        sink: &S,
        now: DateTime<Utc>,
    ) -> Result<String, SessionError> {
        let finalized = self.finalize(now)?;
        let session_id = sink
            .save(&finalized)
            .await
            .map_err(SessionError::Persistence)?;

        self.paused_millis += self.pause_in_progress(now);
        self.paused_at = None;
        self.rest = None;
        self.session_id = Some(session_id.clone());
        self.status = SessionStatus::Completed;
        Ok(session_id)
    }

    /// 진행 중인 일시정지의 길이(밀리초)
    fn pause_in_progress(&self, now: DateTime<Utc>) -> i64 {
        match (self.status, self.paused_at) {
            (SessionStatus::Paused, Some(paused_at)) => {
                (now - paused_at).num_milliseconds().max(0)
            }
            _ => 0,
        }
    }
}

fn rounded_seconds(millis: i64) -> i64 {
    (millis as f64 / 1000.0).round() as i64
}
