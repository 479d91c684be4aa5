//! # 개인 기록(Personal Record) 모델 정의
//!
//! 운동별·지표별 최고 기록입니다. 같은 운동과 지표에 대해 더 높은 값이
//! 나오면 새 기록이 추가됩니다 (기존 기록은 이력으로 남습니다).

use super::schema::{require_non_empty, require_non_negative, Validate};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 기록 지표
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "camelCase")]
#[sqlx(rename_all = "camelCase")]
pub enum RecordType {
    MaxWeight,
    MaxReps,
    BestTime,
    TotalVolume,
}

impl RecordType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::MaxWeight => "maxWeight",
            RecordType::MaxReps => "maxReps",
            RecordType::BestTime => "bestTime",
            RecordType::TotalVolume => "totalVolume",
        }
    }
}

/// 개인 기록 엔티티: `personal_records` 테이블 한 행에 대응합니다.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PersonalRecord {
    pub id: String,
    pub user_id: String,
    pub exercise_id: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: RecordType,
    pub value: f64,
    pub unit: String,
    pub date: String,
    /// 기록이 나온 세션 (수동 입력이면 None)
    pub workout_session_id: Option<String>,
    pub created_at: String,
}

impl Validate for PersonalRecord {
    fn validate(&self) -> Result<(), String> {
        require_non_empty("exercise_id", &self.exercise_id)?;
        require_non_negative("value", self.value)
    }
}

/// 기록 직접 입력 요청: `POST /api/v1/records`
#[derive(Debug, Deserialize)]
pub struct CreatePersonalRecordRequest {
    pub exercise_id: String,
    #[serde(rename = "type")]
    pub kind: RecordType,
    pub value: f64,
    pub unit: String,
    pub date: Option<DateTime<Utc>>,
    pub workout_session_id: Option<String>,
}

impl Validate for CreatePersonalRecordRequest {
    fn validate(&self) -> Result<(), String> {
        require_non_empty("exercise_id", &self.exercise_id)?;
        require_non_negative("value", self.value)?;
        require_non_empty("unit", &self.unit)
    }
}

/// `GET /api/v1/records?exercise_id=...`
#[derive(Debug, Deserialize)]
pub struct RecordListQuery {
    pub exercise_id: Option<String>,
}
