use sqlx::SqlitePool;

use super::{
    model::TraitVector,
    repo_types::{LeaderboardRow, TraitRow},
};
use crate::db::now_micros;

/// Insert the user's row, or overwrite all six fields of the existing one.
///
/// One statement, so concurrent saves for the same user serialise inside
/// SQLite and always leave a single row holding the last committed vector.
pub async fn upsert(db: &SqlitePool, user_id: i64, v: &TraitVector) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO user_traits
            (user_id, empathy, responsibility, courage, fear, selfishness, dishonesty, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        ON CONFLICT(user_id) DO UPDATE SET
            empathy        = excluded.empathy,
            responsibility = excluded.responsibility,
            courage        = excluded.courage,
            fear           = excluded.fear,
            selfishness    = excluded.selfishness,
            dishonesty     = excluded.dishonesty,
            updated_at     = excluded.updated_at
        "#,
    )
    .bind(user_id)
    .bind(v.empathy)
    .bind(v.responsibility)
    .bind(v.courage)
    .bind(v.fear)
    .bind(v.selfishness)
    .bind(v.dishonesty)
    .bind(now_micros())
    .execute(db)
    .await?;
    Ok(())
}

pub async fn find_by_user(db: &SqlitePool, user_id: i64) -> Result<Option<TraitRow>, sqlx::Error> {
    sqlx::query_as::<_, TraitRow>(
        r#"
        SELECT user_id, empathy, responsibility, courage, fear, selfishness, dishonesty, updated_at
        FROM user_traits
        WHERE user_id = ?1
        "#,
    )
    .bind(user_id)
    .fetch_optional(db)
    .await
}

/// Stored vector, or the zero vector before the first save.
pub async fn get(db: &SqlitePool, user_id: i64) -> Result<TraitVector, sqlx::Error> {
    Ok(find_by_user(db, user_id)
        .await?
        .map(|row| row.vector())
        .unwrap_or(TraitVector::ZERO))
}

/// Every user's row, most recently updated first.
pub async fn list_all(db: &SqlitePool) -> Result<Vec<LeaderboardRow>, sqlx::Error> {
    sqlx::query_as::<_, LeaderboardRow>(
        r#"
        SELECT u.username, t.empathy, t.responsibility, t.courage, t.fear,
               t.selfishness, t.dishonesty, t.updated_at
        FROM user_traits t
        JOIN users u ON u.id = t.user_id
        ORDER BY t.updated_at DESC, t.id DESC
        "#,
    )
    .fetch_all(db)
    .await
}
