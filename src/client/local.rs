use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::traits::TraitVector;

/// What the client keeps between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalSave {
    #[serde(default)]
    pub traits: TraitVector,
    /// Display copy only; recomputed from `traits` on load.
    #[serde(default)]
    pub virtue_points: i64,
    #[serde(default)]
    pub completed_tasks: BTreeSet<String>,
    /// Local changes not yet acknowledged by the server.
    #[serde(default)]
    pub unsynced: bool,
}

/// JSON save file on disk.
#[derive(Debug, Clone)]
pub struct SaveFile {
    path: PathBuf,
}

impl SaveFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file is an empty save.
    pub async fn load(&self) -> anyhow::Result<LocalSave> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .with_context(|| format!("parse save file {}", self.path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(LocalSave::default()),
            Err(e) => Err(e).with_context(|| format!("read save file {}", self.path.display())),
        }
    }

    /// Writes through a temp file so a crash never leaves half a save.
    pub async fn store(&self, save: &LocalSave) -> anyhow::Result<()> {
        let bytes = serde_json::to_vec_pretty(save)?;
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, bytes)
            .await
            .with_context(|| format!("write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("replace {}", self.path.display()))?;
        Ok(())
    }

    pub async fn clear(&self) -> anyhow::Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("remove {}", self.path.display())),
        }
    }
}
