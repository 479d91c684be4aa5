//! # 신체 측정 데이터베이스 쿼리 모듈

use crate::error::AppError;
use crate::models::schema::{decode_stored, now_timestamp, timestamp, Validate};
use crate::models::*;
use chrono::Utc;
use sqlx::SqlitePool;
use std::collections::HashMap;

/// 측정 기록을 최신 측정일순으로 최대 `limit`개 조회합니다.
pub async fn list_measurements(
    pool: &SqlitePool,
    user_id: &str,
    kind: Option<MeasurementType>,
    limit: i64,
) -> Result<Vec<Measurement>, AppError> {
    let rows = sqlx::query_as::<_, Measurement>(
        r#"
        SELECT id, user_id, type, value, unit, location, date, notes, created_at
        FROM measurements
        WHERE user_id = ? AND (? IS NULL OR type = ?)
        ORDER BY date DESC
        LIMIT ?
        "#,
    )
    .bind(user_id)
    .bind(kind)
    .bind(kind)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|m| {
            let id = m.id.clone();
            decode_stored("measurements", &id, m)
        })
        .collect()
}

pub async fn get_measurement(
    pool: &SqlitePool,
    user_id: &str,
    id: &str,
) -> Result<Option<Measurement>, AppError> {
    let row = sqlx::query_as::<_, Measurement>(
        r#"
        SELECT id, user_id, type, value, unit, location, date, notes, created_at
        FROM measurements
        WHERE user_id = ? AND id = ?
        "#,
    )
    .bind(user_id)
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(|m| decode_stored("measurements", id, m)).transpose()
}

pub async fn create_measurement(
    pool: &SqlitePool,
    user_id: &str,
    req: &CreateMeasurementRequest,
) -> Result<Measurement, AppError> {
    let id = uuid::Uuid::now_v7().to_string();
    let date = timestamp(req.date.unwrap_or_else(Utc::now));

    sqlx::query(
        r#"
        INSERT INTO measurements (id, user_id, type, value, unit, location, date, notes, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(user_id)
    .bind(req.kind)
    .bind(req.value)
    .bind(&req.unit)
    .bind(&req.location)
    .bind(&date)
    .bind(&req.notes)
    .bind(now_timestamp())
    .execute(pool)
    .await?;

    get_measurement(pool, user_id, &id)
        .await?
        .ok_or(AppError::Internal("Failed to retrieve created measurement".to_string()))
}

pub async fn update_measurement(
    pool: &SqlitePool,
    user_id: &str,
    id: &str,
    req: &UpdateMeasurementRequest,
) -> Result<Option<Measurement>, AppError> {
    let Some(mut measurement) = get_measurement(pool, user_id, id).await? else {
        return Ok(None);
    };

    if let Some(value) = req.value {
        measurement.value = value;
    }
    if let Some(unit) = &req.unit {
        measurement.unit = unit.clone();
    }
    if let Some(location) = &req.location {
        measurement.location = Some(location.clone());
    }
    if let Some(date) = req.date {
        measurement.date = timestamp(date);
    }
    if let Some(notes) = &req.notes {
        measurement.notes = Some(notes.clone());
    }
    measurement.validate().map_err(AppError::BadRequest)?;

    sqlx::query(
        r#"
        UPDATE measurements
        SET value = ?, unit = ?, location = ?, date = ?, notes = ?
        WHERE user_id = ? AND id = ?
        "#,
    )
    .bind(measurement.value)
    .bind(&measurement.unit)
    .bind(&measurement.location)
    .bind(&measurement.date)
    .bind(&measurement.notes)
    .bind(user_id)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(Some(measurement))
}

pub async fn delete_measurement(pool: &SqlitePool, user_id: &str, id: &str) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM measurements WHERE user_id = ? AND id = ?")
        .bind(user_id)
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// 체중·체지방·둘레 각각의 가장 최근 측정값을 돌려줍니다.
///
/// 한 번도 측정하지 않은 종류는 결과 맵에 들어가지 않습니다.
pub async fn latest_measurements(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<HashMap<MeasurementType, Measurement>, AppError> {
    let mut latest = HashMap::new();
    for kind in MeasurementType::TRACKED {
        let newest = list_measurements(pool, user_id, Some(kind), 1).await?;
        if let Some(measurement) = newest.into_iter().next() {
            latest.insert(kind, measurement);
        }
    }
    Ok(latest)
}
