use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Redirect, Response},
    routing::post,
    Form, Router,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, RegisterRequest},
        services,
    },
    error::AppError,
    session::{self, claims::SessionKeys, extractors::session_cookie},
    state::AppState,
};

pub const GAME_ENTRY: &str = "/phaser.html";
pub const AUTH_PAGE: &str = "/auth.html";

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

/// `/auth.html?error=<message>`, the only way these form posts report failure.
pub fn error_redirect(err: &AppError) -> Redirect {
    let query = serde_urlencoded::to_string([("error", err.public_message())])
        .unwrap_or_else(|_| "error=Server%20error.".into());
    Redirect::to(&format!("{AUTH_PAGE}?{query}"))
}

/// Issues a session for `user` and sends the browser into the game.
async fn enter_game(state: &AppState, user_id: i64, username: &str) -> Result<Response, AppError> {
    let keys = SessionKeys::from_ref(state);
    let issued = session::services::issue(&state.db, &keys, user_id, username).await?;
    let jar = CookieJar::new().add(session_cookie(&issued.token, &keys));
    Ok((jar, Redirect::to(GAME_ENTRY)).into_response())
}

#[instrument(skip(state, payload), fields(username = %payload.username))]
pub async fn register(
    State(state): State<AppState>,
    Form(payload): Form<RegisterRequest>,
) -> Response {
    let result = async {
        let user = services::register(&state.db, payload).await?;
        enter_game(&state, user.id, &user.username).await
    }
    .await;

    result.unwrap_or_else(|e| {
        warn!(error = %e, "registration failed");
        error_redirect(&e).into_response()
    })
}

#[instrument(skip(state, payload), fields(username = %payload.username))]
pub async fn login(
    State(state): State<AppState>,
    Form(payload): Form<LoginRequest>,
) -> Response {
    let result = async {
        let user = services::authenticate(&state.db, &payload).await?;
        enter_game(&state, user.id, &user.username).await
    }
    .await;

    result.unwrap_or_else(|e| {
        warn!(error = %e, "login failed");
        error_redirect(&e).into_response()
    })
}
