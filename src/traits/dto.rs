use serde::{Deserialize, Serialize};

use super::{model::{TraitDelta, TraitVector}, repo_types::LeaderboardEntry};

/// Body of `POST /api/traits/save`. `traits` must be present; fields inside
/// it may be omitted and count as 0.
#[derive(Debug, Deserialize)]
pub struct SaveTraitsRequest {
    #[serde(default)]
    pub traits: Option<TraitDelta>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TraitsResponse {
    pub traits: TraitVector,
}

#[derive(Debug, Serialize)]
pub struct LeaderboardResponse {
    pub users: Vec<LeaderboardEntry>,
}
