//! Merge stage: reconcile a translated delta into the authoritative
//! translated dictionaries.
//!
//! Pairs files by identical relative path. For every target row, the first
//! source row with an equal source text contributes its translation. The
//! target file is rewritten only when at least one row actually changed;
//! source files without a target counterpart are skipped.

use std::path::Path;

use anyhow::Result;
use rayon::prelude::*;

use crate::dict;

pub struct MergeOptions<'a> {
    /// The translated delta (batch translator output).
    pub source_root: &'a Path,
    /// The authoritative translated dictionary tree.
    pub target_root: &'a Path,
}

#[derive(Debug, Default)]
pub struct MergeSummary {
    pub files_paired: usize,
    pub files_updated: usize,
    pub rows_updated: usize,
    pub warnings: Vec<String>,
}

struct PairOutcome {
    rows_updated: usize,
    written: bool,
    warning: Option<String>,
}

pub fn run(opts: &MergeOptions) -> Result<MergeSummary> {
    let pairs: Vec<String> = dict::list_dictionary_files(opts.source_root)
        .into_iter()
        .filter(|rel| opts.target_root.join(rel).exists())
        .collect();

    let outcomes: Vec<PairOutcome> = pairs
        .par_iter()
        .map(|rel| merge_pair(opts, rel))
        .collect();

    let mut summary = MergeSummary {
        files_paired: pairs.len(),
        ..MergeSummary::default()
    };
    for outcome in outcomes {
        if outcome.written {
            summary.files_updated += 1;
        }
        summary.rows_updated += outcome.rows_updated;
        summary.warnings.extend(outcome.warning);
    }
    Ok(summary)
}

fn merge_pair(opts: &MergeOptions, rel_path: &str) -> PairOutcome {
    match try_merge_pair(opts, rel_path) {
        Ok((rows_updated, written)) => PairOutcome {
            rows_updated,
            written,
            warning: None,
        },
        Err(err) => PairOutcome {
            rows_updated: 0,
            written: false,
            warning: Some(format!("skipped {rel_path}: {err:#}")),
        },
    }
}

fn try_merge_pair(opts: &MergeOptions, rel_path: &str) -> Result<(usize, bool)> {
    let source_rows = dict::read_rows(&opts.source_root.join(rel_path))?;
    let target_path = opts.target_root.join(rel_path);
    let mut target_rows = dict::read_rows(&target_path)?;

    if source_rows.is_empty() || target_rows.is_empty() {
        return Ok((0, false));
    }

    let mut rows_updated = 0;
    for target_row in &mut target_rows {
        if target_row.len() < 2 {
            continue;
        }
        let Some(source_row) = source_rows
            .iter()
            .find(|s| s.len() > 2 && s[1] == target_row[1])
        else {
            continue;
        };

        while target_row.len() < 3 {
            target_row.push(String::new());
        }
        if target_row[2] != source_row[2] {
            target_row[2] = source_row[2].clone();
            rows_updated += 1;
        }
    }

    if rows_updated == 0 {
        return Ok((0, false));
    }
    dict::write_rows(&target_path, &target_rows)?;
    Ok((rows_updated, true))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    use super::*;

    fn row3(id: u32, text: &str, translation: &str) -> Vec<String> {
        vec![id.to_string(), text.to_owned(), translation.to_owned()]
    }

    #[test]
    fn test_first_matching_source_row_wins() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("source");
        let target = dir.path().join("target");
        dict::write_rows(
            &source.join("a.twee.csv"),
            &[row3(1, "Hello", "你好"), row3(2, "Hello", "您好")],
        )
        .unwrap();
        dict::write_rows(&target.join("a.twee.csv"), &[row3(5, "Hello", "")]).unwrap();

        let summary = run(&MergeOptions {
            source_root: &source,
            target_root: &target,
        })
        .unwrap();
        assert_eq!(summary.rows_updated, 1);

        let rows = dict::read_rows(&target.join("a.twee.csv")).unwrap();
        assert_eq!(rows, vec![vec!["5", "Hello", "你好"]]);
    }

    #[test]
    fn test_missing_target_skipped() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("source");
        let target = dir.path().join("target");
        fs::create_dir_all(&target).unwrap();
        dict::write_rows(&source.join("only-here.twee.csv"), &[row3(1, "x", "y")]).unwrap();

        let summary = run(&MergeOptions {
            source_root: &source,
            target_root: &target,
        })
        .unwrap();
        assert_eq!(summary.files_paired, 0);
        assert!(!target.join("only-here.twee.csv").exists());
    }

    #[test]
    fn test_unchanged_target_not_rewritten() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("source");
        let target = dir.path().join("target");
        dict::write_rows(&source.join("a.twee.csv"), &[row3(1, "Hello", "你好")]).unwrap();
        dict::write_rows(&target.join("a.twee.csv"), &[row3(1, "Hello", "你好")]).unwrap();

        let target_path = target.join("a.twee.csv");
        let mtime_before = fs::metadata(&target_path).unwrap().modified().unwrap();

        let summary = run(&MergeOptions {
            source_root: &source,
            target_root: &target,
        })
        .unwrap();
        assert_eq!(summary.files_updated, 0);
        assert_eq!(
            fs::metadata(&target_path).unwrap().modified().unwrap(),
            mtime_before
        );
    }

    #[test]
    fn test_two_column_target_rows_gain_translation_column() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("source");
        let target = dir.path().join("target");
        dict::write_rows(&source.join("a.twee.csv"), &[row3(1, "Hello", "你好")]).unwrap();
        dict::write_rows(
            &target.join("a.twee.csv"),
            &[vec!["1".into(), "Hello".into()], vec!["2".into(), "Bye".into()]],
        )
        .unwrap();

        run(&MergeOptions {
            source_root: &source,
            target_root: &target,
        })
        .unwrap();

        let rows = dict::read_rows(&target.join("a.twee.csv")).unwrap();
        assert_eq!(rows[0], vec!["1", "Hello", "你好"]);
        // Unmatched rows keep their shape.
        assert_eq!(rows[1], vec!["2", "Bye"]);
    }

    #[test]
    fn test_empty_source_is_a_no_op() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("source");
        let target = dir.path().join("target");
        fs::create_dir_all(&source).unwrap();
        dict::write_rows(&target.join("a.twee.csv"), &[row3(1, "Hello", "")]).unwrap();

        let summary = run(&MergeOptions {
            source_root: &source,
            target_root: &target,
        })
        .unwrap();
        assert_eq!(summary.files_paired, 0);
        assert_eq!(summary.rows_updated, 0);
    }
}
