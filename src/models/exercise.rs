//! # 운동(Exercise) 모델 정의
//!
//! 사용자가 직접 등록하는 운동 카탈로그 항목입니다.
//! 운동 루틴(Workout)의 처방(prescription)은 이 운동들의 ID를 참조합니다.
//!
//! ## 구조체 역할
//! - `ExerciseRow`: DB 행 그대로 (근육군/장비/설명 목록은 JSON 문자열)
//! - `Exercise`: 디코딩과 검증을 통과한 응답용 엔티티
//! - `CreateExerciseRequest` / `UpdateExerciseRequest`: 요청 본문

use super::schema::{decode_json_column, decode_stored, require_non_empty, require_url, Validate};
use crate::error::AppError;
use serde::{Deserialize, Serialize};

/// 운동 분류
///
/// `sqlx::Type`: TEXT 컬럼의 "strength" 같은 값을 enum으로 바로 디코딩합니다.
/// 알 수 없는 값이 저장되어 있으면 디코딩 에러가 납니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum ExerciseCategory {
    Strength,
    Cardio,
    Flexibility,
}

#[derive(Debug, sqlx::FromRow)]
pub struct ExerciseRow {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub description: Option<String>,
    pub category: ExerciseCategory,
    pub muscle_groups: String,
    pub equipment: String,
    pub instructions: String,
    pub image_url: Option<String>,
    pub video_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// 운동 엔티티: `exercises` 테이블 한 행에 대응합니다.
#[derive(Debug, Clone, Serialize)]
pub struct Exercise {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub description: Option<String>,
    pub category: ExerciseCategory,
    /// 사용하는 근육군 (예: "chest", "back"). 최소 1개
    pub muscle_groups: Vec<String>,
    pub equipment: Vec<String>,
    /// 단계별 수행 방법
    pub instructions: Vec<String>,
    pub image_url: Option<String>,
    pub video_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<ExerciseRow> for Exercise {
    type Error = AppError;

    fn try_from(row: ExerciseRow) -> Result<Self, Self::Error> {
        let exercise = Exercise {
            muscle_groups: decode_json_column("exercises", "muscle_groups", &row.id, &row.muscle_groups)?,
            equipment: decode_json_column("exercises", "equipment", &row.id, &row.equipment)?,
            instructions: decode_json_column("exercises", "instructions", &row.id, &row.instructions)?,
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            description: row.description,
            category: row.category,
            image_url: row.image_url,
            video_url: row.video_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        };
        let id = exercise.id.clone();
        decode_stored("exercises", &id, exercise)
    }
}

impl Validate for Exercise {
    fn validate(&self) -> Result<(), String> {
        validate_exercise_fields(
            &self.name,
            &self.muscle_groups,
            self.image_url.as_deref(),
            self.video_url.as_deref(),
        )
    }
}

impl Exercise {
    /// 검색어가 이름, 설명, 근육군 중 하나에 포함되는지 (대소문자 무시)
    pub fn matches(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.name.to_lowercase().contains(&term)
            || self
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&term))
            || self
                .muscle_groups
                .iter()
                .any(|g| g.to_lowercase().contains(&term))
    }
}

/// 운동 생성 요청: `POST /api/v1/exercises`
#[derive(Debug, Deserialize)]
pub struct CreateExerciseRequest {
    pub name: String,
    pub description: Option<String>,
    pub category: ExerciseCategory,
    pub muscle_groups: Vec<String>,
    #[serde(default)]
    pub equipment: Vec<String>,
    #[serde(default)]
    pub instructions: Vec<String>,
    pub image_url: Option<String>,
    pub video_url: Option<String>,
}

impl Validate for CreateExerciseRequest {
    fn validate(&self) -> Result<(), String> {
        validate_exercise_fields(
            &self.name,
            &self.muscle_groups,
            self.image_url.as_deref(),
            self.video_url.as_deref(),
        )
    }
}

/// 운동 수정 요청: `PATCH /api/v1/exercises/{id}` (부분 업데이트)
#[derive(Debug, Default, Deserialize)]
pub struct UpdateExerciseRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<ExerciseCategory>,
    pub muscle_groups: Option<Vec<String>>,
    pub equipment: Option<Vec<String>>,
    pub instructions: Option<Vec<String>>,
    pub image_url: Option<String>,
    pub video_url: Option<String>,
}

impl Validate for UpdateExerciseRequest {
    fn validate(&self) -> Result<(), String> {
        if let Some(name) = &self.name {
            require_non_empty("name", name)?;
        }
        if let Some(groups) = &self.muscle_groups {
            if groups.is_empty() {
                return Err("At least one muscle group is required".to_string());
            }
        }
        require_url("image_url", self.image_url.as_deref())?;
        require_url("video_url", self.video_url.as_deref())
    }
}

/// `GET /api/v1/exercises?category=strength`
#[derive(Debug, Deserialize)]
pub struct ExerciseListQuery {
    pub category: Option<ExerciseCategory>,
}

/// `GET /api/v1/exercises/search?q=press&limit=20`
#[derive(Debug, Deserialize)]
pub struct ExerciseSearchQuery {
    pub q: String,
    pub limit: Option<i64>,
}

fn validate_exercise_fields(
    name: &str,
    muscle_groups: &[String],
    image_url: Option<&str>,
    video_url: Option<&str>,
) -> Result<(), String> {
    require_non_empty("name", name)?;
    if muscle_groups.is_empty() {
        return Err("At least one muscle group is required".to_string());
    }
    require_url("image_url", image_url)?;
    require_url("video_url", video_url)
}
