use crate::error::AppError;
use crate::models::schema::{encode_json_column, now_timestamp};
use crate::models::{UpsertProfileRequest, UserProfile, UserProfileRow};
use sqlx::SqlitePool;

pub async fn get_profile(pool: &SqlitePool, user_id: &str) -> Result<Option<UserProfile>, AppError> {
    let row = sqlx::query_as::<_, UserProfileRow>(
        r#"
        SELECT id, email, display_name, photo_url, fitness_goals, preferences,
               created_at, updated_at
        FROM user_profiles
        WHERE id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    row.map(UserProfile::try_from).transpose()
}

/// 프로필을 만들거나(처음 로그인) 덮어씁니다.
///
/// `ON CONFLICT(id) DO UPDATE`: 같은 id가 있으면 INSERT 대신 UPDATE로 바뀝니다.
/// created_at은 처음 만들 때의 값이 유지됩니다.
pub async fn upsert_profile(
    pool: &SqlitePool,
    user_id: &str,
    req: &UpsertProfileRequest,
) -> Result<UserProfile, AppError> {
    let goals = req.fitness_goals.as_ref().map(encode_json_column).transpose()?;
    let preferences = req.preferences.as_ref().map(encode_json_column).transpose()?;
    let now = now_timestamp();

    sqlx::query(
        r#"
        INSERT INTO user_profiles
            (id, email, display_name, photo_url, fitness_goals, preferences, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            email = excluded.email,
            display_name = excluded.display_name,
            photo_url = excluded.photo_url,
            fitness_goals = excluded.fitness_goals,
            preferences = excluded.preferences,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(user_id)
    .bind(&req.email)
    .bind(&req.display_name)
    .bind(&req.photo_url)
    .bind(goals)
    .bind(preferences)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    get_profile(pool, user_id)
        .await?
        .ok_or(AppError::Internal("Failed to retrieve saved profile".to_string()))
}
