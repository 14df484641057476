use sqlx::SqlitePool;
use time::OffsetDateTime;
use tracing::{debug, info};
use uuid::Uuid;

use super::{claims::SessionKeys, repo, repo_types::Session};
use crate::error::{AppError, AppResult};

/// A freshly issued session and the signed token to put in its cookie.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub session: Session,
    pub token: String,
}

fn now() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

/// Anonymous → Authenticated. The session expires `ttl` after issuance and is
/// never extended by later activity. Expired rows left by earlier logins are
/// swept on the way.
pub async fn issue(
    db: &SqlitePool,
    keys: &SessionKeys,
    user_id: i64,
    username: &str,
) -> AppResult<IssuedSession> {
    let sid = Uuid::new_v4();
    let issued_at = now();
    let expires_at = issued_at + keys.ttl_secs;

    let token = keys.sign(sid, user_id, issued_at, expires_at)?;
    let purged = repo::purge_expired(db, issued_at).await?;
    if purged > 0 {
        debug!(purged, "expired sessions removed");
    }
    let session = repo::insert(db, sid, user_id, username, issued_at, expires_at).await?;

    info!(user_id, %sid, "session issued");
    Ok(IssuedSession { session, token })
}

/// Resolves a cookie token to its live session.
///
/// Bad signatures, expired tokens, destroyed sessions and expired rows all
/// come back as `Unauthenticated`.
pub async fn current_user(db: &SqlitePool, keys: &SessionKeys, token: &str) -> AppResult<Session> {
    let claims = keys.verify(token).map_err(|e| {
        debug!(error = %e, "session cookie rejected");
        AppError::Unauthenticated
    })?;

    let session = repo::find_live(db, claims.sid, now())
        .await?
        .ok_or(AppError::Unauthenticated)?;

    if session.user_id != claims.sub {
        return Err(AppError::Unauthenticated);
    }
    Ok(session)
}

/// Returns whether the welcome banner should show and clears the flag in the
/// same statement, so it is true for exactly one caller per login no matter
/// how often the client polls.
pub async fn consume_welcome_flag(db: &SqlitePool, session_id: Uuid) -> AppResult<bool> {
    Ok(repo::take_welcome(db, session_id).await?)
}

/// Authenticated → LoggedOut. The row is gone, so the old cookie stops
/// working immediately.
pub async fn destroy(db: &SqlitePool, session_id: Uuid) -> AppResult<()> {
    if repo::delete(db, session_id).await? {
        info!(sid = %session_id, "session destroyed");
    }
    Ok(())
}
