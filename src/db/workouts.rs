//! # 운동 루틴 데이터베이스 쿼리 모듈
//!
//! 루틴의 운동 처방 목록은 `exercises` JSON 컬럼 하나에 순서대로 저장됩니다.

use crate::error::AppError;
use crate::models::schema::{encode_json_column, now_timestamp, Validate};
use crate::models::*;
use sqlx::SqlitePool;

/// 사용자의 루틴을 최신순으로 조회합니다. `difficulty`가 있으면 해당 난이도만.
pub async fn list_workouts(
    pool: &SqlitePool,
    user_id: &str,
    difficulty: Option<Difficulty>,
) -> Result<Vec<Workout>, AppError> {
    let rows = sqlx::query_as::<_, WorkoutRow>(
        r#"
        SELECT id, user_id, name, description, exercises, estimated_duration,
               difficulty, color, created_at, updated_at
        FROM workouts
        WHERE user_id = ? AND (? IS NULL OR difficulty = ?)
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .bind(difficulty)
    .bind(difficulty)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(Workout::try_from).collect()
}

pub async fn get_workout(
    pool: &SqlitePool,
    user_id: &str,
    id: &str,
) -> Result<Option<Workout>, AppError> {
    let row = sqlx::query_as::<_, WorkoutRow>(
        r#"
        SELECT id, user_id, name, description, exercises, estimated_duration,
               difficulty, color, created_at, updated_at
        FROM workouts
        WHERE user_id = ? AND id = ?
        "#,
    )
    .bind(user_id)
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(Workout::try_from).transpose()
}

pub async fn create_workout(
    pool: &SqlitePool,
    user_id: &str,
    req: &CreateWorkoutRequest,
) -> Result<Workout, AppError> {
    let id = uuid::Uuid::now_v7().to_string();
    let now = now_timestamp();

    sqlx::query(
        r#"
        INSERT INTO workouts (id, user_id, name, description, exercises, estimated_duration,
                              difficulty, color, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(user_id)
    .bind(req.name.trim())
    .bind(&req.description)
    .bind(encode_json_column(&req.exercises)?)
    .bind(req.estimated_duration)
    .bind(req.difficulty)
    .bind(&req.color)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    get_workout(pool, user_id, &id)
        .await?
        .ok_or(AppError::Internal("Failed to retrieve created workout".to_string()))
}

/// 루틴을 부분 업데이트합니다. 합쳐진 결과를 검증한 뒤 저장합니다.
pub async fn update_workout(
    pool: &SqlitePool,
    user_id: &str,
    id: &str,
    req: &UpdateWorkoutRequest,
) -> Result<Option<Workout>, AppError> {
    let Some(mut workout) = get_workout(pool, user_id, id).await? else {
        return Ok(None);
    };

    if let Some(name) = &req.name {
        workout.name = name.trim().to_string();
    }
    if let Some(description) = &req.description {
        workout.description = Some(description.clone());
    }
    if let Some(exercises) = &req.exercises {
        workout.exercises = exercises.clone();
    }
    if let Some(duration) = req.estimated_duration {
        workout.estimated_duration = duration;
    }
    if let Some(difficulty) = req.difficulty {
        workout.difficulty = difficulty;
    }
    if let Some(color) = &req.color {
        workout.color = color.clone();
    }
    workout.validate().map_err(AppError::BadRequest)?;

    sqlx::query(
        r#"
        UPDATE workouts
        SET name = ?, description = ?, exercises = ?, estimated_duration = ?,
            difficulty = ?, color = ?, updated_at = ?
        WHERE user_id = ? AND id = ?
        "#,
    )
    .bind(&workout.name)
    .bind(&workout.description)
    .bind(encode_json_column(&workout.exercises)?)
    .bind(workout.estimated_duration)
    .bind(workout.difficulty)
    .bind(&workout.color)
    .bind(now_timestamp())
    .bind(user_id)
    .bind(id)
    .execute(pool)
    .await?;

    get_workout(pool, user_id, id).await
}

pub async fn delete_workout(pool: &SqlitePool, user_id: &str, id: &str) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM workouts WHERE user_id = ? AND id = ?")
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

    fn push_day() -> CreateWorkoutRequest {
        CreateWorkoutRequest {
            name: "Push Day".to_string(),
            description: None,
            exercises: vec![
                ExercisePrescription {
                    exercise_id: "bench".to_string(),
                    sets: 3,
                    reps: Some(8),
                    weight: Some(60.0),
                    rest_time: 90,
                    notes: None,
                },
                ExercisePrescription {
                    exercise_id: "dips".to_string(),
                    sets: 2,
                    reps: Some(12),
                    weight: None,
                    rest_time: 60,
                    notes: Some("bodyweight".to_string()),
                },
            ],
            estimated_duration: 40,
            difficulty: Difficulty::Intermediate,
            color: "#3B82F6".to_string(),
        }
    }

    #[tokio::test]
    async fn prescriptions_keep_their_order() {
        let pool = test_pool().await;
        let created = create_workout(&pool, "u1", &push_day()).await.unwrap();

        let loaded = get_workout(&pool, "u1", &created.id).await.unwrap().unwrap();
        let ids: Vec<_> = loaded.exercises.iter().map(|e| e.exercise_id.as_str()).collect();
        assert_eq!(ids, ["bench", "dips"]);
        assert_eq!(loaded.exercises[1].notes.as_deref(), Some("bodyweight"));
    }

    #[tokio::test]
    async fn difficulty_filter() {
        let pool = test_pool().await;
        create_workout(&pool, "u1", &push_day()).await.unwrap();

        assert_eq!(
            list_workouts(&pool, "u1", Some(Difficulty::Intermediate)).await.unwrap().len(),
            1
        );
        assert!(list_workouts(&pool, "u1", Some(Difficulty::Beginner)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_cannot_remove_every_exercise() {
        let pool = test_pool().await;
        let created = create_workout(&pool, "u1", &push_day()).await.unwrap();
        let req = UpdateWorkoutRequest {
            exercises: Some(vec![]),
            ..Default::default()
        };

        assert!(matches!(
            update_workout(&pool, "u1", &created.id, &req).await,
            Err(AppError::BadRequest(_))
        ));
        assert!(update_workout(&pool, "u2", &created.id, &UpdateWorkoutRequest::default())
            .await
            .unwrap()
            .is_none());
    }
}
