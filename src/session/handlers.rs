use axum::{
    extract::{FromRef, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{
    claims::SessionKeys,
    extractors::{expired_session_cookie, session_token, AuthSession},
    services,
};
use crate::{auth::dto::PublicUser, error::AppResult, state::AppState};

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionInfo {
    pub user: PublicUser,
    #[serde(rename = "showWelcome")]
    pub show_welcome: bool,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/api/user", get(get_session_info))
        .route("/api/logout", post(logout))
}

/// Identity of the current player.
///
/// Not idempotent: it also consumes the welcome flag, so the first call after
/// login reports `showWelcome: true` and every later call `false`.
#[instrument(skip(state, session), fields(user_id = session.user_id))]
pub async fn get_session_info(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
) -> AppResult<Json<SessionInfo>> {
    let show_welcome = services::consume_welcome_flag(&state.db, session.id).await?;
    Ok(Json(SessionInfo {
        user: PublicUser {
            id: session.user_id,
            username: session.username,
        },
        show_welcome,
    }))
}

/// Destroys the server-side session if the cookie names one, and always
/// tells the browser to drop the cookie.
#[instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> AppResult<impl IntoResponse> {
    let keys = SessionKeys::from_ref(&state);
    if let Some(token) = session_token(&jar) {
        match keys.verify(token) {
            Ok(claims) => services::destroy(&state.db, claims.sid).await?,
            Err(e) => debug!(error = %e, "logout with unusable cookie"),
        }
    }
    Ok((
        jar.add(expired_session_cookie(&keys)),
        Json(SuccessResponse { success: true }),
    ))
}
