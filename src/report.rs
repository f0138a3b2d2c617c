//! Stage summary and warning output.
//!
//! Summaries go to stdout, warnings and recovered failures to stderr with
//! colored severity prefixes. Separate from the pipeline stages so the
//! crate stays usable as a library.

use std::io::{self, Write};

use colored::Colorize;

use crate::{
    diff::DiffSummary, extract::ExtractSummary, merge::MergeSummary, translate::FileStatus,
    translate::TranslateSummary,
};

/// Success mark for consistent output formatting.
pub const SUCCESS_MARK: &str = "\u{2713}"; // ✓

/// Failure mark for consistent output formatting.
pub const FAILURE_MARK: &str = "\u{2718}"; // ✘

pub fn print_warnings(warnings: &[String]) {
    let mut stderr = io::stderr().lock();
    for warning in warnings {
        let _ = writeln!(stderr, "{} {}", "warning:".bold().yellow(), warning);
    }
}

pub fn print_error(message: &str) {
    let mut stderr = io::stderr().lock();
    let _ = writeln!(stderr, "{} {}", "error:".bold().red(), message);
}

pub fn print_extract(summary: &ExtractSummary, verbose: bool) {
    print_warnings(&summary.warnings);
    if verbose {
        println!(
            "extracted {} files ({} from cache)",
            summary.files_scanned, summary.files_from_cache
        );
    }
    println!(
        "{} {}",
        SUCCESS_MARK.green(),
        format!(
            "Extracted {} records into {} dictionaries",
            summary.records, summary.files_with_records
        )
        .green()
    );
}

pub fn print_diff(summary: &DiffSummary, verbose: bool) {
    print_warnings(&summary.warnings);
    if verbose {
        println!(
            "compared {} files ({} copied through)",
            summary.files_compared, summary.files_copied_through
        );
    }
    if summary.rows_pending == 0 {
        println!(
            "{} {}",
            SUCCESS_MARK.green(),
            "No pending rows, translations are up to date".green()
        );
    } else {
        println!(
            "{} rows pending translation in {} files",
            summary.rows_pending, summary.files_with_pending
        );
    }
}

pub fn print_translate(summary: &TranslateSummary) {
    print_warnings(&summary.failures);
    if summary.complete {
        println!(
            "{} {}",
            SUCCESS_MARK.green(),
            format!(
                "Translated {} rows in {} invocations ({} tokens)",
                summary.rows_translated, summary.invocations, summary.tokens_used
            )
            .green()
        );
    } else {
        println!(
            "{} {}",
            FAILURE_MARK.yellow(),
            format!(
                "Paused after {} rows ({} tokens); re-run to continue",
                summary.rows_translated, summary.tokens_used
            )
            .yellow()
        );
    }
}

pub fn print_status(statuses: &[FileStatus], verbose: bool) {
    let mut missing_total = 0;
    for status in statuses {
        let missing = status.pending_rows.saturating_sub(status.translated_rows);
        missing_total += missing;
        if verbose || missing > 0 {
            println!(
                "{}: {}/{} translated",
                status.rel_path, status.translated_rows, status.pending_rows
            );
        }
    }
    if missing_total == 0 {
        println!(
            "{} {}",
            SUCCESS_MARK.green(),
            "All pending rows are translated".green()
        );
    } else {
        println!("{} rows still untranslated", missing_total);
    }
}

pub fn print_merge(summary: &MergeSummary, verbose: bool) {
    print_warnings(&summary.warnings);
    if verbose {
        println!("paired {} files", summary.files_paired);
    }
    println!(
        "{} {}",
        SUCCESS_MARK.green(),
        format!(
            "Merged {} rows into {} files",
            summary.rows_updated, summary.files_updated
        )
        .green()
    );
}
