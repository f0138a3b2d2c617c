//! CLI argument definitions using clap.
//!
//! ## Commands
//!
//! - `extract`: Scan the source tree and write raw dictionaries
//! - `diff`: Compute the pending-translation delta
//! - `translate`: Run the budgeted batch translator over the delta
//! - `status`: Report per-file translation progress without calling a backend
//! - `merge`: Reconcile translated rows back into the translated dictionaries
//! - `init`: Initialize a configuration file

use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Arguments {
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Arguments {
    /// Check if a command was provided, otherwise print help and return None.
    pub fn with_command_or_help(self) -> Option<Self> {
        if self.command.is_none() {
            Self::command().print_help().ok();
            None
        } else {
            Some(self)
        }
    }

    /// Get the verbose flag from the command's common args.
    pub fn verbose(&self) -> bool {
        match &self.command {
            Some(Command::Extract(cmd)) => cmd.common.verbose,
            Some(Command::Diff(cmd)) => cmd.common.verbose,
            Some(Command::Translate(cmd)) => cmd.common.verbose,
            Some(Command::Status(cmd)) => cmd.common.verbose,
            Some(Command::Merge(cmd)) => cmd.common.verbose,
            Some(Command::Init) | None => false,
        }
    }
}

/// Common arguments shared by all commands.
#[derive(Debug, Clone, Args)]
pub struct CommonArgs {
    /// Source tree root (overrides config file)
    #[arg(long)]
    pub source_root: Option<PathBuf>,

    /// Dictionaries root directory (overrides config file)
    #[arg(long)]
    pub dicts_root: Option<PathBuf>,

    /// Target language tag (overrides config file)
    #[arg(long)]
    pub lang: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Args)]
pub struct ExtractCommand {
    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Debug, Args)]
pub struct DiffCommand {
    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Debug, Args)]
pub struct TranslateCommand {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Token budget per batch invocation (overrides config file)
    #[arg(long)]
    pub budget: Option<usize>,

    /// Model identifier recorded in the checkpoint (overrides config file)
    #[arg(long)]
    pub model: Option<String>,

    /// Run a single budgeted batch instead of driving to completion
    #[arg(long)]
    pub single_batch: bool,
}

#[derive(Debug, Args)]
pub struct StatusCommand {
    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Debug, Args)]
pub struct MergeCommand {
    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract translatable lines from the source tree into raw dictionaries
    Extract(ExtractCommand),
    /// Diff raw dictionaries against translated ones into the pending delta
    Diff(DiffCommand),
    /// Translate the pending delta under the configured token budget
    Translate(TranslateCommand),
    /// Show per-file translation progress for the pending delta
    Status(StatusCommand),
    /// Merge translated delta rows into the translated dictionaries
    Merge(MergeCommand),
    /// Initialize a new .tweelocrc.json configuration file
    Init,
}
