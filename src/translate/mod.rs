//! Batch translation engine: token-budgeted, resumable, sequential.
//!
//! Consumes the diff tree in lexicographic file order and emits translated
//! dictionaries under the output root. Exactly one backend call per row;
//! every committed row is flushed to disk and checkpointed before the next
//! row starts, so interruption at any point loses at most the row in
//! flight.
//!
//! Budget admission is two-stage: the projected cost (input estimate times
//! the output amplification factor) gates the call, and the real cost is
//! re-checked after it. A batch that trips either check pauses; the driver
//! loop re-invokes until an invocation translates zero rows.

pub mod backend;
pub mod checkpoint;

use std::{fs::OpenOptions, path::Path};

use anyhow::{Context, Result};

use crate::dict;
pub use backend::{HeuristicCounter, PassthroughBackend, TokenCounter, TranslationBackend};
pub use checkpoint::{Checkpoint, CheckpointStore, FileCheckpointStore, MemoryCheckpointStore};

pub struct TranslateOptions<'a> {
    pub diff_root: &'a Path,
    pub output_root: &'a Path,
    /// Token budget per invocation.
    pub token_budget: usize,
    /// Expected output tokens per input token, for projected cost.
    pub output_amplification: f64,
}

/// One invocation's outcome.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub rows_translated: usize,
    pub tokens_used: usize,
    pub failures: Vec<String>,
    /// True when the budget stopped the batch before the pending set ran out.
    pub paused: bool,
}

/// Accumulated outcome of the driver loop.
#[derive(Debug, Default)]
pub struct TranslateSummary {
    pub rows_translated: usize,
    pub tokens_used: usize,
    pub invocations: usize,
    pub failures: Vec<String>,
    pub complete: bool,
}

/// Per-file progress for the status report.
#[derive(Debug, PartialEq, Eq)]
pub struct FileStatus {
    pub rel_path: String,
    pub pending_rows: usize,
    pub translated_rows: usize,
}

pub struct BatchTranslator<'a> {
    backend: &'a dyn TranslationBackend,
    counter: &'a dyn TokenCounter,
    store: &'a dyn CheckpointStore,
}

impl<'a> BatchTranslator<'a> {
    pub fn new(
        backend: &'a dyn TranslationBackend,
        counter: &'a dyn TokenCounter,
        store: &'a dyn CheckpointStore,
    ) -> Self {
        Self {
            backend,
            counter,
            store,
        }
    }

    /// Run one budgeted batch over the pending set.
    ///
    /// Files lexicographically before the checkpoint cursor are skipped
    /// without re-reading them; the cursor clears when a pass completes.
    pub fn run_batch(&self, opts: &TranslateOptions) -> Result<BatchReport> {
        let mut report = BatchReport::default();
        let cursor = self.store.load()?.map(|checkpoint| checkpoint.last_file);

        for rel_path in dict::list_dictionary_files(opts.diff_root) {
            if let Some(cursor) = &cursor
                && rel_path < *cursor
            {
                continue;
            }
            let source_rows = dict::read_rows(&opts.diff_root.join(&rel_path))?;
            let pending: Vec<&Vec<String>> = source_rows
                .iter()
                .filter(|row| row.len() >= 2 && !row[1].trim().is_empty())
                .collect();
            if pending.is_empty() {
                continue;
            }

            let output_path = opts.output_root.join(&rel_path);
            let mut committed = resume_translated_rows(&output_path)?;
            if committed >= pending.len() {
                continue;
            }

            let output_file = {
                dict::ensure_parent_dir(&output_path)?;
                OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&output_path)
                    .with_context(|| {
                        format!("Failed to open output file: {}", output_path.display())
                    })?
            };
            let mut writer = csv::WriterBuilder::new()
                .flexible(true)
                .from_writer(output_file);

            for row in &pending[committed..] {
                let input = row[1].as_str();
                let estimate = self.counter.count(input);
                let projected = report.tokens_used
                    + (estimate as f64 * opts.output_amplification).ceil() as usize;
                if projected > opts.token_budget {
                    self.save_checkpoint(&rel_path, committed, report.tokens_used)?;
                    report.paused = true;
                    return Ok(report);
                }

                let translation = match self.backend.translate(input) {
                    Ok(raw) => backend::clean_response(&raw),
                    Err(err) => {
                        report
                            .failures
                            .push(format!("{rel_path} row {}: {err:#}", row[0]));
                        input.to_owned()
                    }
                };
                report.tokens_used += estimate + self.counter.count(&translation);

                writer.write_record([row[0].as_str(), input, translation.as_str()])?;
                writer.flush().with_context(|| {
                    format!("Failed to flush output file: {}", output_path.display())
                })?;
                committed += 1;
                report.rows_translated += 1;
                self.save_checkpoint(&rel_path, committed, report.tokens_used)?;

                if report.tokens_used > opts.token_budget {
                    report.paused = true;
                    return Ok(report);
                }
            }
        }

        self.store.clear()?;
        Ok(report)
    }

    /// Re-invoke `run_batch` until an invocation translates zero rows.
    ///
    /// The fixed point is row progress, not pause state: a pass that still
    /// translated something may have skipped files behind a stale checkpoint
    /// cursor, so only a full zero-row pass proves the pending set is drained.
    pub fn run_to_completion(&self, opts: &TranslateOptions) -> Result<TranslateSummary> {
        let mut summary = TranslateSummary::default();
        loop {
            let report = self.run_batch(opts)?;
            summary.invocations += 1;
            summary.rows_translated += report.rows_translated;
            summary.tokens_used += report.tokens_used;
            summary.failures.extend(report.failures);

            if report.rows_translated == 0 {
                summary.complete = !report.paused;
                return Ok(summary);
            }
        }
    }

    fn save_checkpoint(&self, rel_path: &str, committed: usize, tokens: usize) -> Result<()> {
        self.store.save(&Checkpoint::new(
            rel_path,
            committed,
            tokens,
            self.backend.model(),
        ))
    }
}

/// Count the well-formed translated rows at the head of an output file and
/// drop anything after them, so resumption appends to a clean prefix.
fn resume_translated_rows(output_path: &Path) -> Result<usize> {
    if !output_path.exists() {
        return Ok(0);
    }
    let rows = dict::read_rows(output_path)?;
    let valid: Vec<Vec<String>> = rows
        .iter()
        .take_while(|row| row.len() >= 3 && !row[2].trim().is_empty())
        .cloned()
        .collect();
    if valid.len() < rows.len() {
        dict::write_rows(output_path, &valid)?;
    }
    Ok(valid.len())
}

/// Per-file pending vs translated row counts, no backend involved.
pub fn status(diff_root: &Path, output_root: &Path) -> Result<Vec<FileStatus>> {
    let mut statuses = Vec::new();
    for rel_path in dict::list_dictionary_files(diff_root) {
        let pending_rows = dict::read_rows(&diff_root.join(&rel_path))?
            .iter()
            .filter(|row| row.len() >= 2 && !row[1].trim().is_empty())
            .count();
        let output_path = output_root.join(&rel_path);
        let translated_rows = if output_path.exists() {
            dict::read_rows(&output_path)?
                .iter()
                .filter(|row| row.len() >= 3 && !row[2].trim().is_empty())
                .count()
        } else {
            0
        };
        statuses.push(FileStatus {
            rel_path,
            pending_rows,
            translated_rows,
        });
    }
    Ok(statuses)
}
