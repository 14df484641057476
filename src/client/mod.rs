//! Client side of the trait sync: a local accumulator that gameplay mutates,
//! persisted to a save file and pushed to the server as full snapshots.

pub mod accumulator;
pub mod api;
pub mod context;
pub mod local;

pub use accumulator::TraitAccumulator;
pub use api::{HttpTraitApi, TraitApi};
pub use context::PlayerContext;
pub use local::{LocalSave, SaveFile};
