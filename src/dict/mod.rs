//! Dictionary records and CSV persistence.
//!
//! A dictionary is one headerless CSV file per source file, mirroring the
//! source tree's relative path under a per-stage root directory:
//!
//! - raw dictionaries: 2 columns `(id, source_text)`
//! - translated/diff dictionaries: 3 columns `(id, source_text, translated_text)`
//!
//! Row ids are stable only within one extraction run; the diff/merge join
//! key is the literal source text, never the id.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::utils::normalize_rel_path;

/// One translatable unit extracted from a source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRecord {
    /// Row id, unique within one file, not stable across extraction runs.
    pub id: u32,
    /// Literal source-language text. The diff/merge join key.
    pub source_text: String,
    /// Translation, present only in translated/diff dictionaries.
    pub translated_text: Option<String>,
}

impl TextRecord {
    pub fn new(id: u32, source_text: impl Into<String>) -> Self {
        Self {
            id,
            source_text: source_text.into(),
            translated_text: None,
        }
    }
}

/// Read a dictionary file into records.
///
/// Rows with fewer than two columns or an empty `source_text` are invalid
/// and dropped (never an error): short rows carry no join key and cannot
/// take part in diff or merge.
pub fn read_dictionary(path: &Path) -> Result<Vec<TextRecord>> {
    let rows = read_rows(path)?;
    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        if row.len() < 2 || row[1].trim().is_empty() {
            continue;
        }
        let id = row[0].trim().parse::<u32>().unwrap_or(0);
        records.push(TextRecord {
            id,
            source_text: row[1].clone(),
            translated_text: row.get(2).filter(|t| !t.is_empty()).cloned(),
        });
    }
    Ok(records)
}

/// Read a CSV file as raw rows, preserving column count per row.
pub fn read_rows(path: &Path) -> Result<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record =
            record.with_context(|| format!("Malformed CSV row in {}", path.display()))?;
        rows.push(record.iter().map(str::to_owned).collect());
    }
    Ok(rows)
}

/// Write records as a raw (2-column) dictionary.
pub fn write_raw(path: &Path, records: &[TextRecord]) -> Result<()> {
    let rows: Vec<Vec<String>> = records
        .iter()
        .map(|r| vec![r.id.to_string(), r.source_text.clone()])
        .collect();
    write_rows(path, &rows)
}

/// Write raw CSV rows, creating parent directories as needed.
pub fn write_rows(path: &Path, rows: &[Vec<String>]) -> Result<()> {
    ensure_parent_dir(path)?;
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to flush CSV file: {}", path.display()))?;
    Ok(())
}

pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    Ok(())
}

/// List all dictionary files under a stage root, as normalized relative
/// paths in lexicographic order.
///
/// The fixed order is what makes batch processing deterministic and the
/// translator's file cursor meaningful.
pub fn list_dictionary_files(root: &Path) -> Vec<String> {
    let mut files: Vec<String> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry.path().extension().and_then(|e| e.to_str()) == Some("csv")
        })
        .filter_map(|entry| {
            entry
                .path()
                .strip_prefix(root)
                .ok()
                .map(normalize_rel_path)
        })
        .collect();
    files.sort();
    files
}

/// Map a source-tree relative path to its dictionary file path under a
/// stage root (`foo/bar.twee` → `<root>/foo/bar.twee.csv`).
pub fn dictionary_path(root: &Path, rel_path: &str) -> PathBuf {
    root.join(format!("{rel_path}.csv"))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_roundtrip_raw_dictionary() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sub").join("file.twee.csv");

        let records = vec![
            TextRecord::new(1, "Hello"),
            TextRecord::new(2, "World, with comma"),
        ];
        write_raw(&path, &records).unwrap();

        let read = read_dictionary(&path).unwrap();
        assert_eq!(read, records);
    }

    #[test]
    fn test_read_drops_invalid_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("d.csv");
        fs::write(&path, "1,Hello\n2,\n3\n4,World\n").unwrap();

        let read = read_dictionary(&path).unwrap();
        assert_eq!(read.len(), 2);
        assert_eq!(read[0].source_text, "Hello");
        assert_eq!(read[1].source_text, "World");
    }

    #[test]
    fn test_read_translated_column() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("d.csv");
        fs::write(&path, "1,Hello,你好\n2,World,\n").unwrap();

        let read = read_dictionary(&path).unwrap();
        assert_eq!(read[0].translated_text.as_deref(), Some("你好"));
        assert_eq!(read[1].translated_text, None);
    }

    #[test]
    fn test_list_dictionary_files_sorted() {
        let dir = tempdir().unwrap();
        write_rows(&dir.path().join("b/x.twee.csv"), &[vec!["1".into(), "b".into()]]).unwrap();
        write_rows(&dir.path().join("a/y.twee.csv"), &[vec!["1".into(), "a".into()]]).unwrap();
        fs::write(dir.path().join("note.txt"), "not a dictionary").unwrap();

        let files = list_dictionary_files(dir.path());
        assert_eq!(files, vec!["a/y.twee.csv", "b/x.twee.csv"]);
    }

    #[test]
    fn test_dictionary_path() {
        let p = dictionary_path(Path::new("dicts/raw"), "game/start.twee");
        assert_eq!(p, Path::new("dicts/raw/game/start.twee.csv"));
    }
}
