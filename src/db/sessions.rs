//! # 운동 세션 기록 데이터베이스 쿼리 모듈
//!
//! 완료된 세션의 저장과 이력 조회를 담당합니다.
//!
//! ## 세션 라이프사이클
//! ```text
//! [라이브 세션] start → 세트 진행 → finish() → insert_finalized_session() → [이력]
//! ```
//! 라이브 세션 도중에는 DB에 아무것도 쓰지 않습니다. 중간에 포기한 세션은
//! 기록이 남지 않습니다.

use crate::error::AppError;
use crate::models::schema::{encode_json_column, now_timestamp, timestamp};
use crate::models::*;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

/// 종료된 세션을 저장하고 새 세션 ID를 돌려줍니다.
pub async fn insert_finalized_session(
    pool: &SqlitePool,
    user_id: &str,
    session: &FinalizedSession,
) -> Result<String, AppError> {
    let id = uuid::Uuid::now_v7().to_string();
    let now = now_timestamp();

    sqlx::query(
        r#"
        INSERT INTO workout_sessions
            (id, user_id, workout_id, name, exercises, start_time, end_time, duration,
             paused_seconds, completed, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(user_id)
    .bind(&session.workout_id)
    .bind(&session.name)
    .bind(encode_json_column(&session.exercises)?)
    .bind(timestamp(session.start_time))
    .bind(timestamp(session.end_time))
    .bind(session.duration_minutes)
    .bind(session.paused_seconds)
    .bind(session.completed)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    Ok(id)
}

pub async fn get_workout_session(
    pool: &SqlitePool,
    user_id: &str,
    id: &str,
) -> Result<Option<WorkoutSessionRecord>, AppError> {
    let row = sqlx::query_as::<_, WorkoutSessionRow>(
        r#"
        SELECT id, user_id, workout_id, name, exercises, start_time, end_time, duration,
               paused_seconds, notes, completed, created_at, updated_at
        FROM workout_sessions
        WHERE user_id = ? AND id = ?
        "#,
    )
    .bind(user_id)
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(WorkoutSessionRecord::try_from).transpose()
}

/// 세션 이력을 시작 시각 최신순으로 조회합니다.
///
/// `workout_id`가 주어지면 그 루틴으로 수행한 세션만 돌려줍니다.
pub async fn list_workout_sessions(
    pool: &SqlitePool,
    user_id: &str,
    workout_id: Option<&str>,
    limit: i64,
) -> Result<Vec<WorkoutSessionRecord>, AppError> {
    let rows = sqlx::query_as::<_, WorkoutSessionRow>(
        r#"
        SELECT id, user_id, workout_id, name, exercises, start_time, end_time, duration,
               paused_seconds, notes, completed, created_at, updated_at
        FROM workout_sessions
        WHERE user_id = ? AND (? IS NULL OR workout_id = ?)
        ORDER BY start_time DESC
        LIMIT ?
        "#,
    )
    .bind(user_id)
    .bind(workout_id)
    .bind(workout_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(WorkoutSessionRecord::try_from).collect()
}

/// 최근에 "완료된" 세션을 종료 시각 최신순으로 조회합니다.
pub async fn recent_completed_sessions(
    pool: &SqlitePool,
    user_id: &str,
    limit: i64,
) -> Result<Vec<WorkoutSessionRecord>, AppError> {
    let rows = sqlx::query_as::<_, WorkoutSessionRow>(
        r#"
        SELECT id, user_id, workout_id, name, exercises, start_time, end_time, duration,
               paused_seconds, notes, completed, created_at, updated_at
        FROM workout_sessions
        WHERE user_id = ? AND completed = 1
        ORDER BY end_time DESC
        LIMIT ?
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(WorkoutSessionRecord::try_from).collect()
}

/// `since` 이후에 끝난 완료 세션의 (개수, 총 운동 시간(분))
pub async fn completed_totals_since(
    pool: &SqlitePool,
    user_id: &str,
    since: DateTime<Utc>,
) -> Result<(i64, i64), AppError> {
    let totals = sqlx::query_as::<_, (i64, i64)>(
        r#"
        SELECT COUNT(*), COALESCE(SUM(duration), 0)
        FROM workout_sessions
        WHERE user_id = ? AND completed = 1 AND end_time >= ?
        "#,
    )
    .bind(user_id)
    .bind(timestamp(since))
    .fetch_one(pool)
    .await?;

    Ok(totals)
}

/// 저장된 세션의 메모를 바꿉니다. 세트 기록 자체는 종료 후 수정할 수 없습니다.
pub async fn update_session_notes(
    pool: &SqlitePool,
    user_id: &str,
    id: &str,
    notes: Option<&str>,
) -> Result<Option<WorkoutSessionRecord>, AppError> {
    let result = sqlx::query(
        r#"
        UPDATE workout_sessions
        SET notes = ?, updated_at = ?
        WHERE user_id = ? AND id = ?
        "#,
    )
    .bind(notes)
    .bind(now_timestamp())
    .bind(user_id)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    get_workout_session(pool, user_id, id).await
}

pub async fn delete_workout_session(
    pool: &SqlitePool,
    user_id: &str,
    id: &str,
) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM workout_sessions WHERE user_id = ? AND id = ?")
        .bind(user_id)
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use chrono::{Duration, TimeZone};

    fn finished(workout_id: &str, start: DateTime<Utc>, minutes: i64) -> FinalizedSession {
        FinalizedSession {
            workout_id: workout_id.to_string(),
            name: "Push Day".to_string(),
            exercises: vec![SessionExercise {
                exercise_id: "bench".to_string(),
                sets: vec![SessionSet {
                    reps: Some(8),
                    weight: Some(60.0),
                    rest_time: Some(90),
                    completed: true,
                }],
                notes: String::new(),
            }],
            start_time: start,
            end_time: start + Duration::minutes(minutes),
            duration_minutes: minutes,
            paused_seconds: 0,
            completed: true,
        }
    }

    #[tokio::test]
    async fn saved_session_round_trips_through_the_decoder() {
        let pool = test_pool().await;
        let start = Utc.with_ymd_and_hms(2026, 3, 2, 18, 0, 0).unwrap();
        let id = insert_finalized_session(&pool, "u1", &finished("w1", start, 45))
            .await
            .unwrap();

        let stored = get_workout_session(&pool, "u1", &id).await.unwrap().unwrap();
        assert_eq!(stored.duration, Some(45));
        assert!(stored.completed);
        assert_eq!(stored.exercises[0].sets[0].weight, Some(60.0));
        assert_eq!(stored.start_time, "2026-03-02T18:00:00.000Z");
        assert!(get_workout_session(&pool, "u2", &id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn filters_by_workout_and_totals_by_window() {
        let pool = test_pool().await;
        let now = Utc::now();
        insert_finalized_session(&pool, "u1", &finished("w1", now - Duration::days(10), 50))
            .await
            .unwrap();
        insert_finalized_session(&pool, "u1", &finished("w1", now - Duration::days(2), 30))
            .await
            .unwrap();
        insert_finalized_session(&pool, "u1", &finished("w2", now - Duration::days(1), 20))
            .await
            .unwrap();

        assert_eq!(list_workout_sessions(&pool, "u1", Some("w1"), 50).await.unwrap().len(), 2);
        assert_eq!(list_workout_sessions(&pool, "u1", None, 2).await.unwrap().len(), 2);

        let (count, minutes) = completed_totals_since(&pool, "u1", now - Duration::days(7))
            .await
            .unwrap();
        assert_eq!((count, minutes), (2, 50));

        let recent = recent_completed_sessions(&pool, "u1", 5).await.unwrap();
        assert_eq!(recent[0].workout_id.as_deref(), Some("w2"));
    }

    #[tokio::test]
    async fn notes_can_be_edited_after_completion() {
        let pool = test_pool().await;
        let start = Utc.with_ymd_and_hms(2026, 3, 2, 18, 0, 0).unwrap();
        let id = insert_finalized_session(&pool, "u1", &finished("w1", start, 45))
            .await
            .unwrap();

        let updated = update_session_notes(&pool, "u1", &id, Some("felt strong"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.notes.as_deref(), Some("felt strong"));
        assert!(update_session_notes(&pool, "u2", &id, None).await.unwrap().is_none());
        assert!(delete_workout_session(&pool, "u1", &id).await.unwrap());
    }
}
