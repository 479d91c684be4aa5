//! # 신체 측정 모델 정의
//!
//! 체중, 체지방률, 둘레 등 날짜별 신체 측정값을 기록합니다.

use super::schema::{require_non_empty, require_non_negative, Validate};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 측정 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "camelCase")]
#[sqlx(rename_all = "camelCase")]
pub enum MeasurementType {
    Weight,
    BodyFat,
    Circumference,
    Other,
}

impl MeasurementType {
    /// 대시보드에 "최신 값"을 보여주는 종류들
    pub const TRACKED: [MeasurementType; 3] = [
        MeasurementType::Weight,
        MeasurementType::BodyFat,
        MeasurementType::Circumference,
    ];
}

/// 측정 엔티티: `measurements` 테이블 한 행에 대응합니다.
///
/// 컬럼 이름 `type`은 Rust 예약어라서 필드는 `kind`로 두고 이름을 바꿔 매핑합니다.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Measurement {
    pub id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: MeasurementType,
    pub value: f64,
    /// 단위 (예: "kg", "%", "cm")
    pub unit: String,
    /// 둘레 측정 부위 (예: "waist")
    pub location: Option<String>,
    pub date: String,
    pub notes: Option<String>,
    pub created_at: String,
}

impl Validate for Measurement {
    fn validate(&self) -> Result<(), String> {
        require_non_negative("value", self.value)?;
        require_non_empty("unit", &self.unit)
    }
}

/// 측정 생성 요청: `POST /api/v1/measurements`
#[derive(Debug, Deserialize)]
pub struct CreateMeasurementRequest {
    #[serde(rename = "type")]
    pub kind: MeasurementType,
    pub value: f64,
    pub unit: String,
    pub location: Option<String>,
    /// 측정 일시. 생략하면 현재 시각
    pub date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl Validate for CreateMeasurementRequest {
    fn validate(&self) -> Result<(), String> {
        require_non_negative("value", self.value)?;
        require_non_empty("unit", &self.unit)
    }
}

/// 측정 수정 요청: `PATCH /api/v1/measurements/{id}`
#[derive(Debug, Default, Deserialize)]
pub struct UpdateMeasurementRequest {
    pub value: Option<f64>,
    pub unit: Option<String>,
    pub location: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl Validate for UpdateMeasurementRequest {
    fn validate(&self) -> Result<(), String> {
        if let Some(value) = self.value {
            require_non_negative("value", value)?;
        }
        if let Some(unit) = &self.unit {
            require_non_empty("unit", unit)?;
        }
        Ok(())
    }
}

/// `GET /api/v1/measurements?type=weight&limit=30`
#[derive(Debug, Deserialize)]
pub struct MeasurementListQuery {
    #[serde(rename = "type")]
    pub kind: Option<MeasurementType>,
    pub limit: Option<i64>,
}
