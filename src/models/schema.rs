//! # 스키마 검증 및 디코딩 유틸리티
//!
//! 저장소 경계에서 데이터를 "믿지 않고 검사"하기 위한 공통 도구입니다.
//!
//! - 요청 본문: `validated()` → 실패 시 400 Bad Request
//! - 저장된 레코드: `decode_stored()` / `decode_json_column()` → 실패 시 500 (레코드 거부)
//!
//! 깨진 레코드는 부분적으로라도 반환하지 않습니다(fail closed).

use crate::error::AppError;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;

/// 값이 도메인 제약(길이, 범위, 개수 등)을 만족하는지 검사하는 트레이트
///
/// 실패하면 사람이 읽을 수 있는 이유를 `Err(String)`으로 돌려줍니다.
pub trait Validate {
    fn validate(&self) -> Result<(), String>;
}

/// 클라이언트가 보낸 값을 검증합니다. 실패하면 400 응답이 됩니다.
pub fn validated<T: Validate>(value: T) -> Result<T, AppError> {
    value.validate().map_err(AppError::BadRequest)?;
    Ok(value)
}

/// DB에서 읽은 레코드를 검증합니다.
///
/// 여기서 실패한다는 것은 저장된 데이터가 손상되었다는 뜻이므로
/// 레코드를 버리고 내부 에러로 처리합니다.
pub fn decode_stored<T: Validate>(table: &str, id: &str, value: T) -> Result<T, AppError> {
    value.validate().map_err(|reason| {
        AppError::Internal(format!("malformed record {}/{}: {}", table, id, reason))
    })?;
    Ok(value)
}

/// JSON 텍스트 컬럼을 타입이 있는 값으로 디코딩합니다.
pub fn decode_json_column<T: DeserializeOwned>(
    table: &str,
    column: &str,
    id: &str,
    raw: &str,
) -> Result<T, AppError> {
    serde_json::from_str(raw).map_err(|e| {
        AppError::Internal(format!(
            "malformed record {}/{}: column {} is not valid: {}",
            table, id, column, e
        ))
    })
}

/// 값을 JSON 텍스트 컬럼에 저장할 문자열로 인코딩합니다.
pub fn encode_json_column<T: serde::Serialize>(value: &T) -> Result<String, AppError> {
    serde_json::to_string(value)
        .map_err(|e| AppError::Internal(format!("JSON encoding failed: {}", e)))
}

/// DB에 저장하는 타임스탬프 형식 (예: "2026-03-01T09:30:00.000Z")
///
/// 모든 테이블이 같은 형식을 쓰므로 문자열 정렬이 곧 시간순 정렬입니다.
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn now_timestamp() -> String {
    timestamp(Utc::now())
}

/// 문자열이 비어 있지 않은지(공백만 있는 경우 포함) 검사합니다.
pub fn require_non_empty(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{} is required", field));
    }
    Ok(())
}

/// 0 이상의 유한한 숫자인지 검사합니다. NaN과 무한대는 거부합니다.
pub fn require_non_negative(field: &str, value: f64) -> Result<(), String> {
    if !value.is_finite() || value < 0.0 {
        return Err(format!("{} must be a non-negative number", field));
    }
    Ok(())
}

pub fn require_url(field: &str, value: Option<&str>) -> Result<(), String> {
    match value {
        Some(url) if !(url.starts_with("http://") || url.starts_with("https://")) => {
            Err(format!("{} must be an http(s) URL", field))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamps_sort_lexically() {
        let earlier = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap();

        assert_eq!(timestamp(earlier), "2026-03-01T09:00:00.000Z");
        assert!(timestamp(earlier) < timestamp(later));
    }

    #[test]
    fn malformed_json_column_is_rejected() {
        let result: Result<Vec<String>, _> =
            decode_json_column("exercises", "muscle_groups", "ex-1", "{not json");
        assert!(matches!(result, Err(AppError::Internal(_))));
    }

    #[test]
    fn numeric_guards() {
        assert!(require_non_negative("weight", 0.0).is_ok());
        assert!(require_non_negative("weight", -1.0).is_err());
        assert!(require_non_negative("weight", f64::NAN).is_err());
        assert!(require_url("image_url", Some("ftp://x")).is_err());
        assert!(require_url("image_url", None).is_ok());
    }
}
