use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Server-side session row.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Session {
    pub id: Uuid,
    pub user_id: i64,
    pub username: String,
    pub expires_at: i64, // unix seconds, fixed at issuance
    /// Read-and-clear: see [`crate::session::services::consume_welcome_flag`].
    #[sqlx(rename = "show_welcome")]
    pub show_welcome_once: bool,
}
