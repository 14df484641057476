use std::collections::BTreeSet;

use crate::traits::{TraitDelta, TraitVector};

use super::local::LocalSave;

/// Local mirror of the player's trait vector.
///
/// Deltas add up here; the server only ever sees the resulting full vector.
/// While `dirty` is set the local state is authoritative over the server copy.
#[derive(Debug, Clone, Default)]
pub struct TraitAccumulator {
    traits: TraitVector,
    score: i64,
    completed_tasks: BTreeSet<String>,
    dirty: bool,
}

impl TraitAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_save(save: LocalSave) -> Self {
        let mut acc = Self {
            traits: save.traits,
            score: 0,
            completed_tasks: save.completed_tasks,
            dirty: save.unsynced,
        };
        acc.recalculate_score();
        acc
    }

    pub fn to_save(&self) -> LocalSave {
        LocalSave {
            traits: self.traits,
            virtue_points: self.score,
            completed_tasks: self.completed_tasks.clone(),
            unsynced: self.dirty,
        }
    }

    pub fn traits(&self) -> TraitVector {
        self.traits
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Adds the supplied fields and refreshes the score; returns the new score.
    pub fn apply_delta(&mut self, delta: &TraitDelta) -> i64 {
        self.traits.apply(delta);
        self.dirty = true;
        self.recalculate_score()
    }

    pub fn recalculate_score(&mut self) -> i64 {
        self.score = self.traits.virtue_points();
        self.score
    }

    /// False if the task was already done.
    pub fn mark_task_completed(&mut self, key: &str) -> bool {
        let added = self.completed_tasks.insert(key.to_string());
        if added {
            self.dirty = true;
        }
        added
    }

    pub fn is_task_completed(&self, key: &str) -> bool {
        self.completed_tasks.contains(key)
    }

    /// Takes the server's vector, unless there are local changes it has not
    /// seen yet.
    pub fn adopt_remote(&mut self, remote: TraitVector) -> bool {
        if self.dirty {
            return false;
        }
        self.traits = remote;
        self.recalculate_score();
        true
    }

    /// Called after `snapshot` was stored remotely. Deltas applied while the
    /// request was in flight keep the accumulator dirty.
    pub fn mark_flushed(&mut self, snapshot: &TraitVector) {
        if self.traits == *snapshot {
            self.dirty = false;
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
