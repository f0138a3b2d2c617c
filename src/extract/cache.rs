//! Content-addressed extraction cache.
//!
//! Keyed by the SHA-256 of the dialect profile name plus the file content,
//! so any edit to a source file (or a profile rename) invalidates its entry
//! without bookkeeping. A hit short-circuits scanning and assignment
//! parsing for that file. Single-process assumption; entries are written
//! whole and never mutated.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::dict::{TextRecord, ensure_parent_dir};

/// Everything extraction produces for one source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSnapshot {
    pub rel_path: String,
    pub profile: String,
    /// Translatable lines, deduplicated, ids 1-based.
    pub records: Vec<TextRecord>,
    /// Distinct variable references, sorted.
    pub variables: Vec<String>,
    /// Every assignment statement, as raw lines.
    pub assignments: Vec<String>,
    /// The translatable subset of the assignment values' raw lines.
    pub pending: Vec<String>,
}

pub struct ExtractionCache {
    root: PathBuf,
}

impl ExtractionCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Cache key for a file: hex SHA-256 over profile name and content.
    pub fn key(profile_name: &str, content: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(profile_name.as_bytes());
        hasher.update(content.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    fn object_path(&self, key: &str) -> PathBuf {
        self.root.join("objects").join(format!("{key}.json"))
    }

    /// Load a snapshot by key. A missing or unreadable entry is a miss,
    /// never an error.
    pub fn load(&self, key: &str) -> Option<FileSnapshot> {
        let raw = fs::read_to_string(self.object_path(key)).ok()?;
        serde_json::from_str(&raw).ok()
    }

    pub fn store(&self, key: &str, snapshot: &FileSnapshot) -> Result<()> {
        let path = self.object_path(key);
        ensure_parent_dir(&path)?;
        let json = serde_json::to_string_pretty(snapshot)?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write cache entry: {}", path.display()))?;
        Ok(())
    }

    /// Write a flat union snapshot (variables, assignments or pending set)
    /// gathered across all files.
    pub fn write_union(&self, name: &str, values: &[String]) -> Result<()> {
        let path = self.root.join(format!("{name}.json"));
        ensure_parent_dir(&path)?;
        let json = serde_json::to_string_pretty(values)?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write cache union: {}", path.display()))?;
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    use super::*;

    fn snapshot() -> FileSnapshot {
        FileSnapshot {
            rel_path: "a/b.twee".into(),
            profile: "normal".into(),
            records: vec![TextRecord::new(1, "Hello")],
            variables: vec!["$name".into()],
            assignments: vec!["<<set $name to \"Alice\">>".into()],
            pending: vec!["<<set $name to \"Alice\">>".into()],
        }
    }

    #[test]
    fn test_key_changes_with_content_and_profile() {
        let a = ExtractionCache::key("normal", "text");
        let b = ExtractionCache::key("normal", "text edited");
        let c = ExtractionCache::key("widget-heavy", "text");
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, ExtractionCache::key("normal", "text"));
    }

    #[test]
    fn test_store_then_load() {
        let dir = tempdir().unwrap();
        let cache = ExtractionCache::new(dir.path());
        let snap = snapshot();
        let key = ExtractionCache::key(&snap.profile, "content");

        assert!(cache.load(&key).is_none());
        cache.store(&key, &snap).unwrap();
        assert_eq!(cache.load(&key), Some(snap));
    }

    #[test]
    fn test_corrupt_entry_is_a_miss() {
        let dir = tempdir().unwrap();
        let cache = ExtractionCache::new(dir.path());
        let key = ExtractionCache::key("normal", "content");
        let path = dir.path().join("objects").join(format!("{key}.json"));
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{ not json").unwrap();

        assert!(cache.load(&key).is_none());
    }
}
