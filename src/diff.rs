//! Diff stage: raw vs translated dictionaries, pending-translation delta out.
//!
//! For every raw dictionary file, rows whose source text has no case-exact
//! match in the translated counterpart become the pending set for that
//! file. A missing or unusable translated file means the whole raw file is
//! pending (copy-through). Diff output supersedes whatever a previous run
//! left behind.

use std::{collections::HashSet, fs, path::Path};

use anyhow::Result;
use rayon::prelude::*;

use crate::dict;

pub struct DiffOptions<'a> {
    pub raw_root: &'a Path,
    pub translated_root: &'a Path,
    pub diff_root: &'a Path,
}

#[derive(Debug, Default)]
pub struct DiffSummary {
    pub files_compared: usize,
    pub files_copied_through: usize,
    pub files_with_pending: usize,
    pub rows_pending: usize,
    pub warnings: Vec<String>,
}

struct PairOutcome {
    rel_path: String,
    pending: Vec<Vec<String>>,
    copied_through: bool,
    warning: Option<String>,
}

/// Diff every raw dictionary against its translated counterpart.
pub fn run(opts: &DiffOptions) -> Result<DiffSummary> {
    let rel_paths = dict::list_dictionary_files(opts.raw_root);

    let outcomes: Vec<PairOutcome> = rel_paths
        .par_iter()
        .map(|rel| diff_pair(opts, rel))
        .collect();

    let mut summary = DiffSummary {
        files_compared: outcomes.len(),
        ..DiffSummary::default()
    };

    for outcome in outcomes {
        if outcome.copied_through {
            summary.files_copied_through += 1;
        }
        summary.warnings.extend(outcome.warning);

        let diff_path = opts.diff_root.join(&outcome.rel_path);
        if outcome.pending.is_empty() {
            // Supersede any previous run's delta for this file.
            if diff_path.exists() {
                fs::remove_file(&diff_path)?;
            }
            continue;
        }
        dict::write_rows(&diff_path, &outcome.pending)?;
        summary.files_with_pending += 1;
        summary.rows_pending += outcome.pending.len();
    }

    Ok(summary)
}

fn diff_pair(opts: &DiffOptions, rel_path: &str) -> PairOutcome {
    let raw_rows = match dict::read_rows(&opts.raw_root.join(rel_path)) {
        Ok(rows) => rows,
        Err(err) => {
            return PairOutcome {
                rel_path: rel_path.to_owned(),
                pending: Vec::new(),
                copied_through: false,
                warning: Some(format!("skipped {rel_path}: {err:#}")),
            };
        }
    };

    let translated_path = opts.translated_root.join(rel_path);
    if !translated_path.exists() {
        return copy_through(rel_path, raw_rows, None);
    }

    let translated_rows = match dict::read_rows(&translated_path) {
        Ok(rows) => rows,
        Err(err) => {
            return copy_through(
                rel_path,
                raw_rows,
                Some(format!("unreadable translated file {rel_path}: {err:#}")),
            );
        }
    };

    if translated_rows.is_empty() || translated_rows.iter().any(|row| row.len() < 3) {
        return copy_through(
            rel_path,
            raw_rows,
            Some(format!("malformed translated file {rel_path}, copying through")),
        );
    }

    let translated_texts: HashSet<&str> =
        translated_rows.iter().map(|row| row[1].as_str()).collect();

    let pending = raw_rows
        .into_iter()
        .filter(|row| row.len() >= 2 && !translated_texts.contains(row[1].as_str()))
        .map(to_pending_row)
        .collect();

    PairOutcome {
        rel_path: rel_path.to_owned(),
        pending,
        copied_through: false,
        warning: None,
    }
}

fn copy_through(rel_path: &str, raw_rows: Vec<Vec<String>>, warning: Option<String>) -> PairOutcome {
    let pending = raw_rows
        .into_iter()
        .filter(|row| row.len() >= 2)
        .map(to_pending_row)
        .collect();
    PairOutcome {
        rel_path: rel_path.to_owned(),
        pending,
        copied_through: true,
        warning,
    }
}

fn to_pending_row(row: Vec<String>) -> Vec<String> {
    let mut row = row;
    row.truncate(2);
    row.push(String::new());
    row
}

/// Total pending rows across the diff tree, without touching the backend.
pub fn count_diff_rows(diff_root: &Path) -> Result<usize> {
    let mut total = 0;
    for rel in dict::list_dictionary_files(diff_root) {
        total += dict::read_rows(&diff_root.join(rel))?.len();
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    use super::*;

    fn raw_row(id: u32, text: &str) -> Vec<String> {
        vec![id.to_string(), text.to_owned()]
    }

    fn translated_row(id: u32, text: &str, translation: &str) -> Vec<String> {
        vec![id.to_string(), text.to_owned(), translation.to_owned()]
    }

    #[test]
    fn test_diff_is_set_difference_on_source_text() {
        let dir = tempdir().unwrap();
        let raw = dir.path().join("raw");
        let translated = dir.path().join("translated");
        let diff = dir.path().join("diff");

        dict::write_rows(
            &raw.join("a.twee.csv"),
            &[raw_row(1, "Old line"), raw_row(2, "New line")],
        )
        .unwrap();
        dict::write_rows(
            &translated.join("a.twee.csv"),
            &[translated_row(1, "Old line", "旧行")],
        )
        .unwrap();

        let summary = run(&DiffOptions {
            raw_root: &raw,
            translated_root: &translated,
            diff_root: &diff,
        })
        .unwrap();
        assert_eq!(summary.rows_pending, 1);

        let rows = dict::read_rows(&diff.join("a.twee.csv")).unwrap();
        assert_eq!(rows, vec![vec!["2", "New line", ""]]);
    }

    #[test]
    fn test_missing_translated_file_copies_through() {
        let dir = tempdir().unwrap();
        let raw = dir.path().join("raw");
        let diff = dir.path().join("diff");
        dict::write_rows(&raw.join("a.twee.csv"), &[raw_row(1, "Only line")]).unwrap();

        let summary = run(&DiffOptions {
            raw_root: &raw,
            translated_root: &dir.path().join("translated"),
            diff_root: &diff,
        })
        .unwrap();
        assert_eq!(summary.files_copied_through, 1);
        assert!(summary.warnings.is_empty());

        let rows = dict::read_rows(&diff.join("a.twee.csv")).unwrap();
        assert_eq!(rows, vec![vec!["1", "Only line", ""]]);
    }

    #[test]
    fn test_malformed_translated_file_copies_through_with_warning() {
        let dir = tempdir().unwrap();
        let raw = dir.path().join("raw");
        let translated = dir.path().join("translated");
        let diff = dir.path().join("diff");
        dict::write_rows(&raw.join("a.twee.csv"), &[raw_row(1, "Line")]).unwrap();
        // Two columns only: no translation column.
        dict::write_rows(&translated.join("a.twee.csv"), &[raw_row(1, "Line")]).unwrap();

        let summary = run(&DiffOptions {
            raw_root: &raw,
            translated_root: &translated,
            diff_root: &diff,
        })
        .unwrap();
        assert_eq!(summary.files_copied_through, 1);
        assert_eq!(summary.warnings.len(), 1);
        assert!(diff.join("a.twee.csv").exists());
    }

    #[test]
    fn test_empty_diff_not_written_and_stale_diff_removed() {
        let dir = tempdir().unwrap();
        let raw = dir.path().join("raw");
        let translated = dir.path().join("translated");
        let diff = dir.path().join("diff");

        dict::write_rows(&raw.join("a.twee.csv"), &[raw_row(1, "Line")]).unwrap();
        dict::write_rows(
            &translated.join("a.twee.csv"),
            &[translated_row(1, "Line", "行")],
        )
        .unwrap();
        // Stale delta from an earlier run.
        dict::write_rows(&diff.join("a.twee.csv"), &[translated_row(1, "Line", "")]).unwrap();

        let summary = run(&DiffOptions {
            raw_root: &raw,
            translated_root: &translated,
            diff_root: &diff,
        })
        .unwrap();
        assert_eq!(summary.files_with_pending, 0);
        assert!(!diff.join("a.twee.csv").exists());
    }

    #[test]
    fn test_count_diff_rows() {
        let dir = tempdir().unwrap();
        let diff = dir.path().join("diff");
        dict::write_rows(
            &diff.join("a.twee.csv"),
            &[translated_row(1, "x", ""), translated_row(2, "y", "")],
        )
        .unwrap();
        dict::write_rows(&diff.join("b.twee.csv"), &[translated_row(1, "z", "")]).unwrap();

        assert_eq!(count_diff_rows(&diff).unwrap(), 3);
    }
}
