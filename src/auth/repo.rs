use crate::auth::repo_types::User;
use sqlx::SqlitePool;
use time::OffsetDateTime;

impl User {
    /// Find a user by exact username.
    pub async fn find_by_username(
        db: &SqlitePool,
        username: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash
            FROM users
            WHERE username = ?1
            "#,
        )
        .bind(username)
        .fetch_optional(db)
        .await
    }

    /// Any user holding either the username or the email.
    pub async fn find_by_username_or_email(
        db: &SqlitePool,
        username: &str,
        email: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash
            FROM users
            WHERE username = ?1 OR email = ?2
            LIMIT 1
            "#,
        )
        .bind(username)
        .bind(email)
        .fetch_optional(db)
        .await
    }

    /// Create a new user with hashed password. Fails with a unique violation
    /// if the username or email is already taken.
    pub async fn create(
        db: &SqlitePool,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password_hash, created_at)
            VALUES (?1, ?2, ?3, ?4)
            RETURNING id, username, email, password_hash
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(OffsetDateTime::now_utc().unix_timestamp())
        .fetch_one(db)
        .await
    }

    pub async fn count(db: &SqlitePool) -> Result<i64, sqlx::Error> {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(db)
            .await?;
        Ok(n)
    }
}
