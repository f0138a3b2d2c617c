//! Batch translation checkpoint: the resume cursor.
//!
//! Persisted after every committed row so an interrupted batch loses at
//! most the row in flight. `last_row` is a count of committed rows in
//! `last_file`, not an id; the resume path recounts the output file and
//! trusts the higher of the two.

use std::{
    fs,
    path::PathBuf,
    sync::Mutex,
    time::{SystemTime, UNIX_EPOCH},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::dict::ensure_parent_dir;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub last_file: String,
    pub last_row: usize,
    pub token_used: usize,
    pub last_model: String,
    /// Unix seconds at save time.
    pub timestamp: u64,
}

impl Checkpoint {
    pub fn new(last_file: impl Into<String>, last_row: usize, token_used: usize, model: impl Into<String>) -> Self {
        Self {
            last_file: last_file.into(),
            last_row,
            token_used,
            last_model: model.into(),
            timestamp: unix_seconds(),
        }
    }
}

fn unix_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Checkpoint persistence seam. The batch engine never touches the
/// filesystem for its cursor directly, so tests run against the in-memory
/// store without code change.
pub trait CheckpointStore {
    fn load(&self) -> Result<Option<Checkpoint>>;
    fn save(&self, checkpoint: &Checkpoint) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// File-backed store. Saves write a sibling temp file then rename, so a
/// crash mid-save leaves the previous checkpoint intact.
pub struct FileCheckpointStore {
    path: PathBuf,
}

impl FileCheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CheckpointStore for FileCheckpointStore {
    fn load(&self) -> Result<Option<Checkpoint>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read checkpoint: {}", self.path.display()))?;
        let checkpoint = serde_json::from_str(&raw)
            .with_context(|| format!("Malformed checkpoint: {}", self.path.display()))?;
        Ok(Some(checkpoint))
    }

    fn save(&self, checkpoint: &Checkpoint) -> Result<()> {
        ensure_parent_dir(&self.path)?;
        let tmp = self.path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(checkpoint)?;
        fs::write(&tmp, json)
            .with_context(|| format!("Failed to write checkpoint: {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace checkpoint: {}", self.path.display()))?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)
                .with_context(|| format!("Failed to remove checkpoint: {}", self.path.display()))?;
        }
        Ok(())
    }
}

/// In-memory store for tests and single-shot runs.
#[derive(Default)]
pub struct MemoryCheckpointStore {
    cell: Mutex<Option<Checkpoint>>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Checkpoint>> {
        match self.cell.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl CheckpointStore for MemoryCheckpointStore {
    fn load(&self) -> Result<Option<Checkpoint>> {
        Ok(self.lock().clone())
    }

    fn save(&self, checkpoint: &Checkpoint) -> Result<()> {
        *self.lock() = Some(checkpoint.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.lock() = None;
        Ok(())
    }
}
