//! # 개인 기록(PR) 데이터베이스 쿼리 모듈
//!
//! ## 기록 갱신 규칙
//! ```text
//! 같은 (운동, 지표)의 기존 최고값보다 "엄격하게" 크면 → 새 행 INSERT, true
//! 같거나 작으면                                   → 아무것도 하지 않음, false
//! ```
//! 같은 값으로 여러 번 호출해도 기록은 한 번만 생깁니다.

use crate::error::AppError;
use crate::models::schema::{decode_stored, now_timestamp, timestamp};
use crate::models::*;
use chrono::Utc;
use sqlx::SqlitePool;
use std::collections::HashMap;

fn checked(records: Vec<PersonalRecord>) -> Result<Vec<PersonalRecord>, AppError> {
    records
        .into_iter()
        .map(|r| {
            let id = r.id.clone();
            decode_stored("personal_records", &id, r)
        })
        .collect()
}

/// 사용자의 기록을 최신 날짜순으로 조회합니다. `exercise_id`가 있으면 그 운동만.
pub async fn list_records(
    pool: &SqlitePool,
    user_id: &str,
    exercise_id: Option<&str>,
) -> Result<Vec<PersonalRecord>, AppError> {
    let rows = sqlx::query_as::<_, PersonalRecord>(
        r#"
        SELECT id, user_id, exercise_id, type, value, unit, date, workout_session_id, created_at
        FROM personal_records
        WHERE user_id = ? AND (? IS NULL OR exercise_id = ?)
        ORDER BY date DESC, created_at DESC
        "#,
    )
    .bind(user_id)
    .bind(exercise_id)
    .bind(exercise_id)
    .fetch_all(pool)
    .await?;

    checked(rows)
}

pub async fn get_record(
    pool: &SqlitePool,
    user_id: &str,
    id: &str,
) -> Result<Option<PersonalRecord>, AppError> {
    let row = sqlx::query_as::<_, PersonalRecord>(
        r#"
        SELECT id, user_id, exercise_id, type, value, unit, date, workout_session_id, created_at
        FROM personal_records
        WHERE user_id = ? AND id = ?
        "#,
    )
    .bind(user_id)
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(|r| decode_stored("personal_records", id, r)).transpose()
}

pub async fn create_record(
    pool: &SqlitePool,
    user_id: &str,
    req: &CreatePersonalRecordRequest,
) -> Result<PersonalRecord, AppError> {
    let id = uuid::Uuid::now_v7().to_string();

    sqlx::query(
        r#"
        INSERT INTO personal_records
            (id, user_id, exercise_id, type, value, unit, date, workout_session_id, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(user_id)
    .bind(&req.exercise_id)
    .bind(req.kind)
    .bind(req.value)
    .bind(&req.unit)
    .bind(timestamp(req.date.unwrap_or_else(Utc::now)))
    .bind(&req.workout_session_id)
    .bind(now_timestamp())
    .execute(pool)
    .await?;

    get_record(pool, user_id, &id)
        .await?
        .ok_or(AppError::Internal("Failed to retrieve created record".to_string()))
}

pub async fn delete_record(pool: &SqlitePool, user_id: &str, id: &str) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM personal_records WHERE user_id = ? AND id = ?")
        .bind(user_id)
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// 운동별 최고값 기록을 돌려줍니다 (지표 종류와 무관하게 value가 가장 큰 것).
pub async fn best_records(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<HashMap<String, PersonalRecord>, AppError> {
    let mut best: HashMap<String, PersonalRecord> = HashMap::new();
    for record in list_records(pool, user_id, None).await? {
        match best.get(&record.exercise_id) {
            Some(current) if current.value >= record.value => {}
            _ => {
                best.insert(record.exercise_id.clone(), record);
            }
        }
    }
    Ok(best)
}

/// 가장 최근에 세워진 기록 `limit`개 (대시보드용)
pub async fn recent_records(
    pool: &SqlitePool,
    user_id: &str,
    limit: i64,
) -> Result<Vec<PersonalRecord>, AppError> {
    let rows = sqlx::query_as::<_, PersonalRecord>(
        r#"
        SELECT id, user_id, exercise_id, type, value, unit, date, workout_session_id, created_at
        FROM personal_records
        WHERE user_id = ?
        ORDER BY created_at DESC
        LIMIT ?
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    checked(rows)
}

/// 새 값이 기존 최고 기록을 넘는지 판정하고, 넘으면 기록을 저장합니다.
///
/// 반환값 `true` = 새 기록이 저장됨. 비교와 저장이 하나의 INSERT 문이라서
/// 처음부터 쓰기 잠금을 잡고 시작합니다. 동시에 여러 번 호출되어도 잠금 대기 후 차례로 판정되며,
/// 같거나 더 큰 값이 이미 있으면 아무 행도 추가되지 않습니다.
pub async fn check_and_update_record(
    pool: &SqlitePool,
    user_id: &str,
    exercise_id: &str,
    kind: RecordType,
    value: f64,
    unit: &str,
    workout_session_id: Option<&str>,
) -> Result<bool, AppError> {
    let now = now_timestamp();
    let result = sqlx::query(
        r#"
        INSERT INTO personal_records
            (id, user_id, exercise_id, type, value, unit, date, workout_session_id, created_at)
        SELECT ?, ?, ?, ?, ?, ?, ?, ?, ?
        WHERE NOT EXISTS (
            SELECT 1 FROM personal_records
            WHERE user_id = ? AND exercise_id = ? AND type = ? AND value >= ?
        )
        "#,
    )
    .bind(uuid::Uuid::now_v7().to_string())
    .bind(user_id)
    .bind(exercise_id)
    .bind(kind)
    .bind(value)
    .bind(unit)
    .bind(&now)
    .bind(workout_session_id)
    .bind(&now)
    .bind(user_id)
    .bind(exercise_id)
    .bind(kind)
    .bind(value)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(false);
    }
    tracing::info!(
        "New personal record for {}: {} {} ({})",
        exercise_id,
        value,
        unit,
        kind.as_str()
    );
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

    #[tokio::test]
    async fn only_strictly_greater_values_are_records() {
        let pool = test_pool().await;
        let check = |v: f64| {
            let pool = pool.clone();
            async move {
                check_and_update_record(&pool, "u1", "bench", RecordType::MaxWeight, v, "kg", None)
                    .await
                    .unwrap()
            }
        };

        assert!(check(60.0).await);
        assert!(!check(60.0).await);
        assert!(!check(55.0).await);
        assert!(check(62.5).await);
        assert_eq!(list_records(&pool, "u1", Some("bench")).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn records_are_tracked_per_metric_and_user() {
        let pool = test_pool().await;
        assert!(check_and_update_record(&pool, "u1", "bench", RecordType::MaxWeight, 60.0, "kg", None)
            .await
            .unwrap());
        assert!(check_and_update_record(&pool, "u1", "bench", RecordType::MaxReps, 12.0, "reps", None)
            .await
            .unwrap());
        assert!(check_and_update_record(&pool, "u2", "bench", RecordType::MaxWeight, 40.0, "kg", None)
            .await
            .unwrap());

        let best = best_records(&pool, "u1").await.unwrap();
        assert_eq!(best["bench"].value, 60.0);
        assert_eq!(recent_records(&pool, "u1", 3).await.unwrap().len(), 2);
    }

    /// 운영과 같은 파일 DB + 다중 연결 풀에서 동시에 판정해도 잠금 에러 없이 최고값이 남아야 합니다.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_checks_on_a_shared_file_database() {
        let path = std::env::temp_dir().join(format!("fittrack-{}.db", uuid::Uuid::now_v7()));
        let options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();

        for round in 0..20 {
            let exercise_id = format!("bench-{}", round);
            let check = |value: f64| {
                let pool = pool.clone();
                let exercise_id = exercise_id.clone();
                async move {
                    check_and_update_record(
                        &pool,
                        "u1",
                        &exercise_id,
                        RecordType::MaxWeight,
                        value,
                        "kg",
                        None,
                    )
                    .await
                }
            };
            let (a, b, c) = tokio::join!(
                tokio::spawn(check(60.0)),
                tokio::spawn(check(62.5)),
                tokio::spawn(check(65.0))
            );
            let results = [a.unwrap(), b.unwrap(), c.unwrap()];
            assert!(results.iter().all(|r| r.is_ok()), "{:?}", results);
            // 65는 어떤 순서로 실행돼도 그 시점의 최고값보다 큽니다.
            assert!(matches!(results[2], Ok(true)));
        }

        let best = best_records(&pool, "u1").await.unwrap();
        assert_eq!(best.len(), 20);
        assert!(best.values().all(|record| record.value == 65.0));

        pool.close().await;
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
        }
    }
}
