//! Cookie-bound server-side sessions.

use crate::state::AppState;
use axum::Router;

pub mod claims;
pub mod extractors;
pub mod handlers;
pub mod repo;
pub mod repo_types;
pub mod services;

pub fn router() -> Router<AppState> {
    handlers::session_routes()
}
