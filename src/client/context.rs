use std::sync::Arc;

use tokio::{sync::Mutex, task::JoinHandle};
use tracing::{debug, info, warn};

use super::{accumulator::TraitAccumulator, api::TraitApi, local::SaveFile};
use crate::traits::{TraitDelta, TraitVector};

/// Everything one playing client needs, passed explicitly to whatever scene
/// code wants it. Created at client start, dropped at logout.
///
/// Flushes and logout take `flush_gate`, so only one vector is ever in flight
/// and the server commits them in the order they were read.
#[derive(Clone)]
pub struct PlayerContext {
    acc: Arc<Mutex<TraitAccumulator>>,
    flush_gate: Arc<Mutex<()>>,
    api: Arc<dyn TraitApi>,
    save: SaveFile,
}

impl PlayerContext {
    /// Restores the local save; an unreadable one is logged and replaced by a
    /// fresh accumulator.
    pub async fn open(api: Arc<dyn TraitApi>, save: SaveFile) -> Self {
        let acc = match save.load().await {
            Ok(local) => TraitAccumulator::from_save(local),
            Err(e) => {
                warn!(error = %e, "discarding unreadable save file");
                TraitAccumulator::new()
            }
        };
        Self {
            acc: Arc::new(Mutex::new(acc)),
            flush_gate: Arc::new(Mutex::new(())),
            api,
            save,
        }
    }

    pub async fn traits(&self) -> TraitVector {
        self.acc.lock().await.traits()
    }

    pub async fn score(&self) -> i64 {
        self.acc.lock().await.score()
    }

    pub async fn is_task_completed(&self, key: &str) -> bool {
        self.acc.lock().await.is_task_completed(key)
    }

    /// Applies one decision's effect and returns the refreshed score.
    pub async fn apply(&self, delta: &TraitDelta) -> i64 {
        let mut acc = self.acc.lock().await;
        let score = acc.apply_delta(delta);
        self.persist(&acc).await;
        score
    }

    /// Applies a task's reward the first time it is completed. Returns
    /// `None` if the task was already done.
    pub async fn complete_task(&self, key: &str, delta: &TraitDelta) -> Option<i64> {
        let mut acc = self.acc.lock().await;
        if !acc.mark_task_completed(key) {
            return None;
        }
        let score = acc.apply_delta(delta);
        self.persist(&acc).await;
        info!(task = key, score, "task completed");
        Some(score)
    }

    /// Pushes the full local vector. On failure nothing local changes and a
    /// later call retries; the error is logged, never returned.
    ///
    /// A clean accumulator has nothing to send and returns true straight away.
    pub async fn flush(&self) -> bool {
        let _gate = self.flush_gate.lock().await;
        let snapshot = {
            let acc = self.acc.lock().await;
            if !acc.is_dirty() {
                return true;
            }
            acc.traits()
        };
        match self.api.save_traits(&snapshot).await {
            Ok(()) => {
                let mut acc = self.acc.lock().await;
                acc.mark_flushed(&snapshot);
                self.persist(&acc).await;
                debug!("traits flushed");
                true
            }
            Err(e) => {
                warn!(error = %e, "trait flush failed; keeping local state");
                false
            }
        }
    }

    /// Fire-and-forget flush for gameplay code that must not wait on the
    /// network.
    pub fn spawn_flush(&self) -> JoinHandle<bool> {
        let ctx = self.clone();
        tokio::spawn(async move { ctx.flush().await })
    }

    /// Pulls the server's vector at startup. Ignored while local changes are
    /// unsynced.
    pub async fn load_remote(&self) -> anyhow::Result<bool> {
        let remote = self.api.get_traits().await?;
        let mut acc = self.acc.lock().await;
        let adopted = acc.adopt_remote(remote);
        if adopted {
            self.persist(&acc).await;
        }
        Ok(adopted)
    }

    /// Forgets everything local. Waits for a flush already on the wire, so
    /// nothing writes the save file back afterwards.
    pub async fn logout(&self) -> anyhow::Result<()> {
        let _gate = self.flush_gate.lock().await;
        self.acc.lock().await.reset();
        self.save.clear().await
    }

    async fn persist(&self, acc: &TraitAccumulator) {
        if let Err(e) = self.save.store(&acc.to_save()).await {
            warn!(error = %e, path = %self.save.path().display(), "local save failed");
        }
    }
}
