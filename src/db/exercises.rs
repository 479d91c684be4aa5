//! # 운동 카탈로그 데이터베이스 쿼리 모듈
//!
//! 근육군/장비/수행 방법 목록은 JSON 텍스트 컬럼에 저장하고,
//! 읽을 때 `Exercise::try_from`으로 디코딩과 검증을 거칩니다.

use crate::error::AppError;
use crate::models::schema::{encode_json_column, now_timestamp, Validate};
use crate::models::*;
use sqlx::SqlitePool;

/// 사용자의 운동 목록을 최신 등록순으로 조회합니다.
///
/// `(? IS NULL OR category = ?)`: 필터가 None이면 조건 전체가 참이 되어
/// 쿼리 하나로 "전체 조회"와 "분류별 조회"를 모두 처리합니다.
pub async fn list_exercises(
    pool: &SqlitePool,
    user_id: &str,
    category: Option<ExerciseCategory>,
) -> Result<Vec<Exercise>, AppError> {
    let rows = sqlx::query_as::<_, ExerciseRow>(
        r#"
        SELECT id, user_id, name, description, category, muscle_groups, equipment,
               instructions, image_url, video_url, created_at, updated_at
        FROM exercises
        WHERE user_id = ? AND (? IS NULL OR category = ?)
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .bind(category)
    .bind(category)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(Exercise::try_from).collect()
}

pub async fn get_exercise(
    pool: &SqlitePool,
    user_id: &str,
    id: &str,
) -> Result<Option<Exercise>, AppError> {
    let row = sqlx::query_as::<_, ExerciseRow>(
        r#"
        SELECT id, user_id, name, description, category, muscle_groups, equipment,
               instructions, image_url, video_url, created_at, updated_at
        FROM exercises
        WHERE user_id = ? AND id = ?
        "#,
    )
    .bind(user_id)
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(Exercise::try_from).transpose()
}

pub async fn create_exercise(
    pool: &SqlitePool,
    user_id: &str,
    req: &CreateExerciseRequest,
) -> Result<Exercise, AppError> {
    let id = uuid::Uuid::now_v7().to_string();
    let now = now_timestamp();

    sqlx::query(
        r#"
        INSERT INTO exercises (id, user_id, name, description, category, muscle_groups,
                               equipment, instructions, image_url, video_url, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(user_id)
    .bind(req.name.trim())
    .bind(&req.description)
    .bind(req.category)
    .bind(encode_json_column(&req.muscle_groups)?)
    .bind(encode_json_column(&req.equipment)?)
    .bind(encode_json_column(&req.instructions)?)
    .bind(&req.image_url)
    .bind(&req.video_url)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    get_exercise(pool, user_id, &id)
        .await?
        .ok_or(AppError::Internal("Failed to retrieve created exercise".to_string()))
}

/// 운동 정보를 부분 업데이트합니다.
///
/// 기존 값에 요청 필드를 덮어쓴 결과를 먼저 검증한 뒤 한 번에 저장합니다.
/// 그래서 "근육군을 빈 배열로 바꾸기" 같은 요청은 저장 전에 거부됩니다.
pub async fn update_exercise(
    pool: &SqlitePool,
    user_id: &str,
    id: &str,
    req: &UpdateExerciseRequest,
) -> Result<Option<Exercise>, AppError> {
    let Some(mut exercise) = get_exercise(pool, user_id, id).await? else {
        return Ok(None);
    };

    if let Some(name) = &req.name {
        exercise.name = name.trim().to_string();
    }
    if let Some(description) = &req.description {
        exercise.description = Some(description.clone());
    }
    if let Some(category) = req.category {
        exercise.category = category;
    }
    if let Some(groups) = &req.muscle_groups {
        exercise.muscle_groups = groups.clone();
    }
    if let Some(equipment) = &req.equipment {
        exercise.equipment = equipment.clone();
    }
    if let Some(instructions) = &req.instructions {
        exercise.instructions = instructions.clone();
    }
    if let Some(url) = &req.image_url {
        exercise.image_url = Some(url.clone());
    }
    if let Some(url) = &req.video_url {
        exercise.video_url = Some(url.clone());
    }
    exercise.validate().map_err(AppError::BadRequest)?;

    sqlx::query(
        r#"
        UPDATE exercises
        SET name = ?, description = ?, category = ?, muscle_groups = ?, equipment = ?,
            instructions = ?, image_url = ?, video_url = ?, updated_at = ?
        WHERE user_id = ? AND id = ?
        "#,
    )
    .bind(&exercise.name)
    .bind(&exercise.description)
    .bind(exercise.category)
    .bind(encode_json_column(&exercise.muscle_groups)?)
    .bind(encode_json_column(&exercise.equipment)?)
    .bind(encode_json_column(&exercise.instructions)?)
    .bind(&exercise.image_url)
    .bind(&exercise.video_url)
    .bind(now_timestamp())
    .bind(user_id)
    .bind(id)
    .execute(pool)
    .await?;

    get_exercise(pool, user_id, id).await
}

pub async fn delete_exercise(pool: &SqlitePool, user_id: &str, id: &str) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM exercises WHERE user_id = ? AND id = ?")
        .bind(user_id)
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// 이름, 설명, 근육군에 검색어가 포함된 운동을 이름순으로 최대 `limit`개 돌려줍니다.
///
/// 근육군이 JSON 배열로 저장되어 있어 SQL `LIKE`로는 정확히 걸러낼 수 없으므로,
/// 디코딩한 뒤 Rust 쪽에서 필터링합니다. 필터링 후에 limit을 적용합니다.
pub async fn search_exercises(
    pool: &SqlitePool,
    user_id: &str,
    term: &str,
    limit: usize,
) -> Result<Vec<Exercise>, AppError> {
    let rows = sqlx::query_as::<_, ExerciseRow>(
        r#"
        SELECT id, user_id, name, description, category, muscle_groups, equipment,
               instructions, image_url, video_url, created_at, updated_at
        FROM exercises
        WHERE user_id = ?
        ORDER BY name
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    let mut found = Vec::new();
    for row in rows {
        let exercise = Exercise::try_from(row)?;
        if exercise.matches(term) {
            found.push(exercise);
            if found.len() == limit {
                break;
            }
        }
    }
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    fn bench_press() -> CreateExerciseRequest {
        CreateExerciseRequest {
            name: "Bench Press".to_string(),
            description: Some("Flat barbell press".to_string()),
            category: ExerciseCategory::Strength,
            muscle_groups: vec!["chest".to_string(), "arms".to_string()],
            equipment: vec!["barbell".to_string()],
            instructions: vec![],
            image_url: None,
            video_url: None,
        }
    }

    #[tokio::test]
    async fn queries_are_scoped_to_the_owner() {
        let pool = test_pool().await;
        let mine = create_exercise(&pool, "u1", &bench_press()).await.unwrap();

        assert!(get_exercise(&pool, "u2", &mine.id).await.unwrap().is_none());
        assert!(list_exercises(&pool, "u2", None).await.unwrap().is_empty());
        assert!(!delete_exercise(&pool, "u2", &mine.id).await.unwrap());
        assert_eq!(list_exercises(&pool, "u1", None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn category_filter_and_search() {
        let pool = test_pool().await;
        create_exercise(&pool, "u1", &bench_press()).await.unwrap();
        let mut run = bench_press();
        run.name = "Treadmill".to_string();
        run.description = None;
        run.category = ExerciseCategory::Cardio;
        run.muscle_groups = vec!["legs".to_string()];
        create_exercise(&pool, "u1", &run).await.unwrap();

        let cardio = list_exercises(&pool, "u1", Some(ExerciseCategory::Cardio)).await.unwrap();
        assert_eq!(cardio.len(), 1);
        assert_eq!(cardio[0].name, "Treadmill");

        let by_group = search_exercises(&pool, "u1", "CHEST", 20).await.unwrap();
        assert_eq!(by_group.len(), 1);
        assert_eq!(by_group[0].name, "Bench Press");
        assert!(search_exercises(&pool, "u1", "e", 1).await.unwrap().len() == 1);
    }

    #[tokio::test]
    async fn update_rejects_emptying_muscle_groups() {
        let pool = test_pool().await;
        let created = create_exercise(&pool, "u1", &bench_press()).await.unwrap();

        let req = UpdateExerciseRequest {
            muscle_groups: Some(vec![]),
            ..Default::default()
        };
        assert!(matches!(
            update_exercise(&pool, "u1", &created.id, &req).await,
            Err(AppError::BadRequest(_))
        ));

        let req = UpdateExerciseRequest {
            name: Some("Incline Press".to_string()),
            ..Default::default()
        };
        let updated = update_exercise(&pool, "u1", &created.id, &req).await.unwrap().unwrap();
        assert_eq!(updated.name, "Incline Press");
        assert_eq!(updated.muscle_groups, vec!["chest", "arms"]);
    }
}
