//! Extraction stage: source tree in, raw dictionaries out.
//!
//! Walks the source tree, classifies every file's lines through its dialect
//! profile, and writes one raw dictionary per file that yielded records.
//! Assignment statements are collected as a side-stream and cached along
//! with the line records in the content-addressed store.

pub mod assignments;
pub mod cache;

use std::{collections::HashSet, fs, path::Path};

use anyhow::{Context, Result};
use glob::Pattern;
use rayon::prelude::*;
use walkdir::WalkDir;

use crate::{
    dict::{self, TextRecord},
    scanner::{self, ProfileRegistry},
    utils::{contains_alphanumeric, normalize_rel_path},
};
use assignments::{collect_variables, find_statements, parse_assignment};
use cache::{ExtractionCache, FileSnapshot};

pub struct ExtractOptions<'a> {
    pub source_root: &'a Path,
    pub raw_root: &'a Path,
    pub cache_root: &'a Path,
    /// Extensions without the dot, e.g. `twee`, `js`.
    pub extensions: &'a [String],
    /// Glob patterns over relative paths; empty means everything.
    pub includes: &'a [String],
    pub ignores: &'a [String],
}

#[derive(Debug, Default)]
pub struct ExtractSummary {
    pub files_scanned: usize,
    pub files_from_cache: usize,
    pub files_with_records: usize,
    pub records: usize,
    pub warnings: Vec<String>,
}

struct FileOutcome {
    rel_path: String,
    records: Vec<TextRecord>,
    variables: Vec<String>,
    assignments: Vec<String>,
    pending: Vec<String>,
    from_cache: bool,
    warnings: Vec<String>,
}

/// Discover source files under the root, as sorted relative paths.
pub fn discover_source_files(
    source_root: &Path,
    extensions: &[String],
    includes: &[String],
    ignores: &[String],
) -> Result<Vec<String>> {
    let include_patterns = compile_patterns(includes)?;
    let ignore_patterns = compile_patterns(ignores)?;

    let mut files: Vec<String> = WalkDir::new(source_root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|ext| extensions.iter().any(|wanted| wanted == ext))
        })
        .filter_map(|entry| {
            entry
                .path()
                .strip_prefix(source_root)
                .ok()
                .map(normalize_rel_path)
        })
        .filter(|rel| {
            (include_patterns.is_empty() || include_patterns.iter().any(|p| p.matches(rel)))
                && !ignore_patterns.iter().any(|p| p.matches(rel))
        })
        .collect();
    files.sort();
    Ok(files)
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<Pattern>> {
    patterns
        .iter()
        .map(|p| Pattern::new(p).with_context(|| format!("Invalid glob pattern: {p}")))
        .collect()
}

/// Run extraction over the whole source tree.
///
/// Files are processed in parallel; a single gather step then writes the
/// raw dictionaries and the cache's union snapshots. A file that cannot be
/// read is skipped with a warning, never a batch failure.
pub fn run(opts: &ExtractOptions) -> Result<ExtractSummary> {
    let rel_paths =
        discover_source_files(opts.source_root, opts.extensions, opts.includes, opts.ignores)?;
    let registry = ProfileRegistry::builtin();
    let cache = ExtractionCache::new(opts.cache_root);

    let outcomes: Vec<FileOutcome> = rel_paths
        .par_iter()
        .map(|rel| match extract_file(opts.source_root, rel, registry, &cache) {
            Ok(outcome) => outcome,
            Err(err) => FileOutcome {
                rel_path: rel.clone(),
                records: Vec::new(),
                variables: Vec::new(),
                assignments: Vec::new(),
                pending: Vec::new(),
                from_cache: false,
                warnings: vec![format!("skipped {rel}: {err:#}")],
            },
        })
        .collect();

    let mut summary = ExtractSummary {
        files_scanned: outcomes.len(),
        ..ExtractSummary::default()
    };
    let mut all_variables: Vec<String> = Vec::new();
    let mut all_assignments: Vec<String> = Vec::new();
    let mut all_pending: Vec<String> = Vec::new();

    for outcome in outcomes {
        if outcome.from_cache {
            summary.files_from_cache += 1;
        }
        summary.warnings.extend(outcome.warnings);

        if !outcome.records.is_empty() {
            let path = dict::dictionary_path(opts.raw_root, &outcome.rel_path);
            dict::write_raw(&path, &outcome.records)?;
            summary.files_with_records += 1;
            summary.records += outcome.records.len();
        }

        all_variables.extend(outcome.variables);
        all_assignments.extend(outcome.assignments);
        all_pending.extend(outcome.pending);
    }

    for union in [
        ("variables", &mut all_variables),
        ("assignments", &mut all_assignments),
        ("pending", &mut all_pending),
    ] {
        let (name, values) = union;
        values.sort();
        values.dedup();
        cache.write_union(name, values)?;
    }

    Ok(summary)
}

fn extract_file(
    source_root: &Path,
    rel_path: &str,
    registry: &ProfileRegistry,
    cache: &ExtractionCache,
) -> Result<FileOutcome> {
    let full_path = source_root.join(rel_path);
    let content = fs::read_to_string(&full_path)
        .with_context(|| format!("Failed to read source file: {}", full_path.display()))?;

    let profile = registry.select(Path::new(rel_path));
    let key = ExtractionCache::key(profile.name, &content);

    if let Some(snapshot) = cache.load(&key) {
        return Ok(FileOutcome {
            rel_path: rel_path.to_owned(),
            records: snapshot.records,
            variables: snapshot.variables,
            assignments: snapshot.assignments,
            pending: snapshot.pending,
            from_cache: true,
            warnings: Vec::new(),
        });
    }

    let lines: Vec<&str> = content.lines().collect();
    let outcome = scanner::scan_lines(profile, &lines);

    let mut seen = HashSet::new();
    let mut records = Vec::new();
    for (line, translatable) in lines.iter().zip(&outcome.flags) {
        let text = line.trim();
        if !translatable || !contains_alphanumeric(text) || !seen.insert(text.to_owned()) {
            continue;
        }
        records.push(TextRecord::new(records.len() as u32 + 1, text));
    }

    let statements = find_statements(&content);
    let assignments: Vec<String> = statements.iter().map(|s| s.raw_line()).collect();
    let pending: Vec<String> = statements
        .iter()
        .filter_map(|s| parse_assignment(s).filter(|a| a.value.is_translatable()))
        .map(|a| a.raw_line)
        .collect();

    let snapshot = FileSnapshot {
        rel_path: rel_path.to_owned(),
        profile: profile.name.to_owned(),
        records,
        variables: collect_variables(&content),
        assignments,
        pending,
    };
    cache.store(&key, &snapshot)?;

    let warnings = outcome
        .warnings
        .into_iter()
        .map(|w| format!("{rel_path}: {w}"))
        .collect();

    Ok(FileOutcome {
        rel_path: rel_path.to_owned(),
        records: snapshot.records,
        variables: snapshot.variables,
        assignments: snapshot.assignments,
        pending: snapshot.pending,
        from_cache: false,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    use super::*;

    fn opts<'a>(
        source: &'a Path,
        raw: &'a Path,
        cache: &'a Path,
        extensions: &'a [String],
    ) -> ExtractOptions<'a> {
        ExtractOptions {
            source_root: source,
            raw_root: raw,
            cache_root: cache,
            extensions,
            includes: &[],
            ignores: &[],
        }
    }

    fn write_source(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_extract_writes_raw_dictionary() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("game");
        let raw = dir.path().join("raw");
        let cache = dir.path().join("cache");
        write_source(
            &source,
            "town/street.twee",
            ":: Street\nYou step into the street.\n<<set $here to 1>>\nA cart rattles past.\n",
        );
        let extensions = vec!["twee".to_owned()];

        let summary = run(&opts(&source, &raw, &cache, &extensions)).unwrap();
        assert_eq!(summary.files_scanned, 1);
        assert_eq!(summary.files_with_records, 1);
        assert_eq!(summary.records, 2);

        let records =
            dict::read_dictionary(&dict::dictionary_path(&raw, "town/street.twee")).unwrap();
        assert_eq!(records[0].source_text, "You step into the street.");
        assert_eq!(records[1].source_text, "A cart rattles past.");
    }

    #[test]
    fn test_second_run_hits_cache() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("game");
        let raw = dir.path().join("raw");
        let cache = dir.path().join("cache");
        write_source(&source, "a.twee", ":: A\nSome text.\n");
        let extensions = vec!["twee".to_owned()];

        let first = run(&opts(&source, &raw, &cache, &extensions)).unwrap();
        assert_eq!(first.files_from_cache, 0);

        let second = run(&opts(&source, &raw, &cache, &extensions)).unwrap();
        assert_eq!(second.files_from_cache, 1);
        assert_eq!(second.records, first.records);
    }

    #[test]
    fn test_content_change_invalidates_cache() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("game");
        let raw = dir.path().join("raw");
        let cache = dir.path().join("cache");
        write_source(&source, "a.twee", ":: A\nOld text.\n");
        let extensions = vec!["twee".to_owned()];

        run(&opts(&source, &raw, &cache, &extensions)).unwrap();
        write_source(&source, "a.twee", ":: A\nNew text.\n");
        let second = run(&opts(&source, &raw, &cache, &extensions)).unwrap();
        assert_eq!(second.files_from_cache, 0);

        let records = dict::read_dictionary(&dict::dictionary_path(&raw, "a.twee")).unwrap();
        assert_eq!(records[0].source_text, "New text.");
    }

    #[test]
    fn test_discovery_filters_and_sorts() {
        let dir = tempdir().unwrap();
        let source = dir.path();
        write_source(source, "b/two.twee", "x");
        write_source(source, "a/one.twee", "x");
        write_source(source, "a/skip.txt", "x");
        write_source(source, "ignored/three.twee", "x");

        let files = discover_source_files(
            source,
            &["twee".to_owned()],
            &[],
            &["ignored/**".to_owned()],
        )
        .unwrap();
        assert_eq!(files, vec!["a/one.twee", "b/two.twee"]);
    }

    #[test]
    fn test_duplicate_lines_deduplicated() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("game");
        let raw = dir.path().join("raw");
        let cache = dir.path().join("cache");
        write_source(&source, "a.twee", ":: A\nSame line.\nSame line.\nOther.\n");
        let extensions = vec!["twee".to_owned()];

        run(&opts(&source, &raw, &cache, &extensions)).unwrap();
        let records = dict::read_dictionary(&dict::dictionary_path(&raw, "a.twee")).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, 1);
        assert_eq!(records[1].id, 2);
    }
}
