//! Per-user trait vectors: storage, derived score, and the authenticated API.

use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod handlers;
pub mod model;
pub mod repo;
pub mod repo_types;

pub use model::{TraitDelta, TraitVector};

pub fn router() -> Router<AppState> {
    handlers::trait_routes()
}
