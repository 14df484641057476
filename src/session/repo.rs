use sqlx::SqlitePool;
use uuid::Uuid;

use super::repo_types::Session;

pub async fn insert(
    db: &SqlitePool,
    id: Uuid,
    user_id: i64,
    username: &str,
    created_at: i64,
    expires_at: i64,
) -> Result<Session, sqlx::Error> {
    sqlx::query_as::<_, Session>(
        r#"
        INSERT INTO sessions (id, user_id, username, expires_at, show_welcome, created_at)
        VALUES (?1, ?2, ?3, ?4, 1, ?5)
        RETURNING id, user_id, username, expires_at, show_welcome
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(username)
    .bind(expires_at)
    .bind(created_at)
    .fetch_one(db)
    .await
}

/// The session, unless it is missing or expired at `now`.
pub async fn find_live(db: &SqlitePool, id: Uuid, now: i64) -> Result<Option<Session>, sqlx::Error> {
    sqlx::query_as::<_, Session>(
        r#"
        SELECT id, user_id, username, expires_at, show_welcome
        FROM sessions
        WHERE id = ?1 AND expires_at > ?2
        "#,
    )
    .bind(id)
    .bind(now)
    .fetch_optional(db)
    .await
}

/// Deletes every session already expired at `now`.
pub async fn purge_expired(db: &SqlitePool, now: i64) -> Result<u64, sqlx::Error> {
    let res = sqlx::query(r#"DELETE FROM sessions WHERE expires_at <= ?1"#)
        .bind(now)
        .execute(db)
        .await?;
    Ok(res.rows_affected())
}

/// Clears the welcome flag; true only for the call that actually cleared it.
pub async fn take_welcome(db: &SqlitePool, id: Uuid) -> Result<bool, sqlx::Error> {
    let res = sqlx::query(
        r#"UPDATE sessions SET show_welcome = 0 WHERE id = ?1 AND show_welcome = 1"#,
    )
    .bind(id)
    .execute(db)
    .await?;
    Ok(res.rows_affected() == 1)
}

pub async fn delete(db: &SqlitePool, id: Uuid) -> Result<bool, sqlx::Error> {
    let res = sqlx::query(r#"DELETE FROM sessions WHERE id = ?1"#)
        .bind(id)
        .execute(db)
        .await?;
    Ok(res.rows_affected() > 0)
}
