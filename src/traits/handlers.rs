use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{debug, info, instrument};

use super::{
    dto::{LeaderboardResponse, SaveTraitsRequest, TraitsResponse},
    model::TraitVector,
    repo,
    repo_types::LeaderboardEntry,
};
use crate::{
    error::{AppError, AppResult},
    session::{extractors::AuthSession, handlers::SuccessResponse},
    state::AppState,
};

pub fn trait_routes() -> Router<AppState> {
    Router::new()
        .route("/api/traits/save", post(save_traits))
        .route("/api/traits/get", get(get_traits))
        .route("/api/traits/all", get(get_leaderboard))
}

/// Overwrites the player's stored vector with the full snapshot sent.
///
/// The session is checked before the body is looked at, so an anonymous
/// request is a 401 even when its payload is also bad.
#[instrument(skip(state, session, body), fields(user_id = session.user_id))]
pub async fn save_traits(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    body: Result<Json<SaveTraitsRequest>, JsonRejection>,
) -> AppResult<Json<SuccessResponse>> {
    let Json(body) = body.map_err(|e| {
        debug!(error = %e, "rejected trait payload");
        AppError::InvalidJson
    })?;
    let traits: TraitVector = body.traits.ok_or(AppError::MissingPayload)?.into();

    repo::upsert(&state.db, session.user_id, &traits).await?;

    info!(virtue_points = traits.virtue_points(), "traits saved");
    Ok(Json(SuccessResponse { success: true }))
}

/// Zero vector until the first save.
#[instrument(skip(state, session), fields(user_id = session.user_id))]
pub async fn get_traits(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
) -> AppResult<Json<TraitsResponse>> {
    let traits = repo::get(&state.db, session.user_id).await?;
    Ok(Json(TraitsResponse { traits }))
}

#[instrument(skip(state, _session))]
pub async fn get_leaderboard(
    State(state): State<AppState>,
    AuthSession(_session): AuthSession,
) -> AppResult<Json<LeaderboardResponse>> {
    let users = repo::list_all(&state.db)
        .await?
        .into_iter()
        .map(LeaderboardEntry::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(LeaderboardResponse { users }))
}
