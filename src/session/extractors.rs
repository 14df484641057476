use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;

use super::{claims::SessionKeys, repo_types::Session, services};
use crate::{error::AppError, state::AppState};

pub const SESSION_COOKIE: &str = "vv_session";

/// The session token carried by the request, if any.
pub fn session_token(jar: &CookieJar) -> Option<&str> {
    jar.get(SESSION_COOKIE).map(|c| c.value())
}

fn base_cookie(value: String, keys: &SessionKeys) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(keys.cookie_secure)
        .build()
}

/// Lives exactly as long as the server-side row.
pub fn session_cookie(token: &str, keys: &SessionKeys) -> Cookie<'static> {
    let mut cookie = base_cookie(token.to_owned(), keys);
    cookie.set_max_age(Duration::seconds(keys.ttl_secs));
    cookie
}

/// Sent on logout whether or not the request carried a cookie.
pub fn expired_session_cookie(keys: &SessionKeys) -> Cookie<'static> {
    let mut cookie = base_cookie(String::new(), keys);
    cookie.set_max_age(Duration::ZERO);
    cookie
}

/// The live session behind the request's cookie, or a 401.
pub struct AuthSession(pub Session);

#[async_trait]
impl FromRequestParts<AppState> for AuthSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = session_token(&jar).ok_or(AppError::Unauthenticated)?;
        let keys = SessionKeys::from_ref(state);
        let session = services::current_user(&state.db, &keys, token).await?;
        Ok(AuthSession(session))
    }
}
