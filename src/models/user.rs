//! # 사용자 프로필 모델
//!
//! 로그인 자체는 외부 인증 제공자가 처리하고, 이 서버는 토큰의 `sub`를
//! 사용자 ID로 받아 프로필(표시 이름, 운동 목표, 단위 설정)만 관리합니다.

use super::schema::{decode_json_column, decode_stored, require_non_empty, require_non_negative, require_url, Validate};
use crate::error::AppError;
use serde::{Deserialize, Serialize};

/// 평소 활동량
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Sedentary,
    Light,
    Moderate,
    Active,
    VeryActive,
}

/// 측정 단위계
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    Metric,
    Imperial,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitnessGoals {
    pub weight_target: Option<f64>,
    pub activity_level: ActivityLevel,
    /// 주당 목표 운동 횟수 (1~7)
    pub weekly_workouts: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preferences {
    pub units: Units,
    pub notifications: bool,
}

/// `user_profiles` 테이블의 한 행. JSON 컬럼은 아직 문자열 상태입니다.
#[derive(Debug, sqlx::FromRow)]
pub struct UserProfileRow {
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub photo_url: Option<String>,
    pub fitness_goals: Option<String>,
    pub preferences: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// 사용자 프로필 (API 응답용)
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub photo_url: Option<String>,
    pub fitness_goals: Option<FitnessGoals>,
    pub preferences: Option<Preferences>,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<UserProfileRow> for UserProfile {
    type Error = AppError;

    fn try_from(row: UserProfileRow) -> Result<Self, Self::Error> {
        let fitness_goals = row
            .fitness_goals
            .as_deref()
            .map(|raw| decode_json_column("user_profiles", "fitness_goals", &row.id, raw))
            .transpose()?;
        let preferences = row
            .preferences
            .as_deref()
            .map(|raw| decode_json_column("user_profiles", "preferences", &row.id, raw))
            .transpose()?;

        let profile = UserProfile {
            id: row.id,
            email: row.email,
            display_name: row.display_name,
            photo_url: row.photo_url,
            fitness_goals,
            preferences,
            created_at: row.created_at,
            updated_at: row.updated_at,
        };
        let id = profile.id.clone();
        decode_stored("user_profiles", &id, profile)
    }
}

impl Validate for UserProfile {
    fn validate(&self) -> Result<(), String> {
        validate_profile_fields(
            &self.email,
            &self.display_name,
            self.photo_url.as_deref(),
            self.fitness_goals.as_ref(),
        )
    }
}

/// 프로필 생성/수정 요청: `PUT /api/v1/profile`
///
/// 프로필은 사용자당 하나이므로 생성과 수정을 upsert 한 번으로 처리합니다.
#[derive(Debug, Deserialize)]
pub struct UpsertProfileRequest {
    pub email: String,
    pub display_name: String,
    pub photo_url: Option<String>,
    pub fitness_goals: Option<FitnessGoals>,
    pub preferences: Option<Preferences>,
}

impl Validate for UpsertProfileRequest {
    fn validate(&self) -> Result<(), String> {
        validate_profile_fields(
            &self.email,
            &self.display_name,
            self.photo_url.as_deref(),
            self.fitness_goals.as_ref(),
        )
    }
}

fn validate_profile_fields(
    email: &str,
    display_name: &str,
    photo_url: Option<&str>,
    goals: Option<&FitnessGoals>,
) -> Result<(), String> {
    if !email.contains('@') {
        return Err("Invalid email address".to_string());
    }
    require_non_empty("display_name", display_name)?;
    require_url("photo_url", photo_url)?;
    if let Some(goals) = goals {
        if !(1..=7).contains(&goals.weekly_workouts) {
            return Err("weekly_workouts must be between 1 and 7".to_string());
        }
        if let Some(target) = goals.weight_target {
            require_non_negative("weight_target", target)?;
        }
    }
    Ok(())
}
