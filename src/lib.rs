//! Tweeloc - incremental localization pipeline for templated-script corpora
//!
//! Tweeloc extracts candidate strings from a Twee-like script corpus,
//! diffs them against an existing translation corpus, submits only the
//! delta to a machine-translation backend under a token budget, and merges
//! the results back. Every stage is resumable and partial-failure tolerant.
//!
//! ## Module Structure
//!
//! - `cli`: Command-line interface layer
//! - `config`: Configuration file loading and parsing
//! - `scanner`: Per-line translatability classification, driven by dialect profiles
//! - `extract`: Source-tree extraction with a content-addressed cache
//! - `dict`: Dictionary records and CSV persistence
//! - `diff`: Pending-translation delta computation
//! - `translate`: Token-budgeted, checkpointed batch translation engine
//! - `merge`: Reconciliation of translated rows into the translated corpus
//! - `report`: Stage summary and warning output
//! - `utils`: Shared utility functions

pub mod cli;
pub mod config;
pub mod dict;
pub mod diff;
pub mod extract;
pub mod merge;
pub mod report;
pub mod scanner;
pub mod translate;
pub mod utils;
