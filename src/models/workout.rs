//! # 운동 루틴(Workout) 모델 정의
//!
//! 루틴은 운동 처방(`ExercisePrescription`)의 순서 있는 목록입니다.
//! 세션이 시작되면 루틴은 바뀌지 않는 입력(`WorkoutDefinition`)으로 취급됩니다.

use super::schema::{decode_json_column, decode_stored, require_non_empty, require_non_negative, Validate};
use crate::error::AppError;
use serde::{Deserialize, Serialize};

/// 난이도
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

/// 한 운동에 허용되는 최대 세트 수
pub const MAX_SETS: u32 = 100;
/// 세트 사이 휴식의 최대 길이(초)
pub const MAX_REST_SECONDS: u32 = 3600;

/// 한 운동에 대한 계획: 몇 세트, 몇 회, 몇 kg, 세트 사이 휴식 몇 초
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExercisePrescription {
    pub exercise_id: String,
    /// 세트 수 (1 ~ `MAX_SETS`)
    pub sets: u32,
    /// 목표 반복 횟수 (있다면 1 이상)
    pub reps: Option<u32>,
    /// 목표 무게 (있다면 0 이상)
    pub weight: Option<f64>,
    /// 세트 사이 휴식 시간(초, `MAX_REST_SECONDS` 이하)
    pub rest_time: u32,
    pub notes: Option<String>,
}

impl Validate for ExercisePrescription {
    fn validate(&self) -> Result<(), String> {
        require_non_empty("exercise_id", &self.exercise_id)?;
        if !(1..=MAX_SETS).contains(&self.sets) {
            return Err(format!(
                "{}: sets must be between 1 and {}",
                self.exercise_id, MAX_SETS
            ));
        }
        if self.rest_time > MAX_REST_SECONDS {
            return Err(format!(
                "{}: rest_time must be at most {} seconds",
                self.exercise_id, MAX_REST_SECONDS
            ));
        }
        if self.reps == Some(0) {
            return Err(format!("{}: reps must be at least 1", self.exercise_id));
        }
        if let Some(weight) = self.weight {
            require_non_negative("weight", weight)?;
        }
        Ok(())
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct WorkoutRow {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub description: Option<String>,
    pub exercises: String,
    pub estimated_duration: i64,
    pub difficulty: Difficulty,
    pub color: String,
    pub created_at: String,
    pub updated_at: String,
}

/// 운동 루틴 엔티티: `workouts` 테이블 한 행에 대응합니다.
#[derive(Debug, Clone, Serialize)]
pub struct Workout {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub description: Option<String>,
    pub exercises: Vec<ExercisePrescription>,
    /// 예상 소요 시간(분)
    pub estimated_duration: i64,
    pub difficulty: Difficulty,
    /// 목록 화면에서 쓰는 표시 색상 (예: "#3B82F6")
    pub color: String,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<WorkoutRow> for Workout {
    type Error = AppError;

    fn try_from(row: WorkoutRow) -> Result<Self, Self::Error> {
        let workout = Workout {
            exercises: decode_json_column("workouts", "exercises", &row.id, &row.exercises)?,
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            description: row.description,
            estimated_duration: row.estimated_duration,
            difficulty: row.difficulty,
            color: row.color,
            created_at: row.created_at,
            updated_at: row.updated_at,
        };
        let id = workout.id.clone();
        decode_stored("workouts", &id, workout)
    }
}

impl Validate for Workout {
    fn validate(&self) -> Result<(), String> {
        validate_workout_fields(&self.name, &self.exercises, self.estimated_duration)
    }
}

/// 루틴 생성 요청: `POST /api/v1/workouts`
#[derive(Debug, Deserialize)]
pub struct CreateWorkoutRequest {
    pub name: String,
    pub description: Option<String>,
    pub exercises: Vec<ExercisePrescription>,
    pub estimated_duration: i64,
    pub difficulty: Difficulty,
    pub color: String,
}

impl Validate for CreateWorkoutRequest {
    fn validate(&self) -> Result<(), String> {
        validate_workout_fields(&self.name, &self.exercises, self.estimated_duration)
    }
}

/// 루틴 수정 요청: `PATCH /api/v1/workouts/{id}`
#[derive(Debug, Default, Deserialize)]
pub struct UpdateWorkoutRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub exercises: Option<Vec<ExercisePrescription>>,
    pub estimated_duration: Option<i64>,
    pub difficulty: Option<Difficulty>,
    pub color: Option<String>,
}

impl Validate for UpdateWorkoutRequest {
    fn validate(&self) -> Result<(), String> {
        if let Some(name) = &self.name {
            require_non_empty("name", name)?;
        }
        if let Some(exercises) = &self.exercises {
            validate_prescriptions(exercises)?;
        }
        if matches!(self.estimated_duration, Some(d) if d < 1) {
            return Err("estimated_duration must be at least 1 minute".to_string());
        }
        Ok(())
    }
}

/// `GET /api/v1/workouts?difficulty=beginner`
#[derive(Debug, Deserialize)]
pub struct WorkoutListQuery {
    pub difficulty: Option<Difficulty>,
}

fn validate_workout_fields(
    name: &str,
    exercises: &[ExercisePrescription],
    estimated_duration: i64,
) -> Result<(), String> {
    require_non_empty("name", name)?;
    validate_prescriptions(exercises)?;
    if estimated_duration < 1 {
        return Err("estimated_duration must be at least 1 minute".to_string());
    }
    Ok(())
}

fn validate_prescriptions(exercises: &[ExercisePrescription]) -> Result<(), String> {
    if exercises.is_empty() {
        return Err("A workout needs at least one exercise".to_string());
    }
    exercises.iter().try_for_each(Validate::validate)
}
