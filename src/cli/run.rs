//! Command dispatch.
//!
//! Resolves configuration (CLI flags > config file > defaults), runs the
//! requested pipeline stage and prints its summary. Configuration problems
//! are fatal before any work starts; everything recoverable inside a stage
//! surfaces as warnings and a `Failure` exit status.

use std::{env, fs, path::Path};

use anyhow::Result;

use super::{
    args::{Arguments, Command, CommonArgs, TranslateCommand},
    exit_status::ExitStatus,
};
use crate::{
    config::{CONFIG_FILE_NAME, Config, default_config_json, load_config},
    diff, extract, merge, report,
    translate::{
        self, BatchTranslator, FileCheckpointStore, HeuristicCounter, PassthroughBackend,
        TranslateOptions, TranslateSummary,
    },
};

pub fn run(Arguments { command }: Arguments) -> Result<ExitStatus> {
    let Some(command) = command else {
        anyhow::bail!("No command provided. Use --help to see available commands.")
    };

    if let Command::Init = command {
        init()?;
        println!("Created {CONFIG_FILE_NAME}");
        return Ok(ExitStatus::Success);
    }

    let config = resolve_config(&command)?;

    match command {
        Command::Extract(cmd) => {
            let summary = extract::run(&extract::ExtractOptions {
                source_root: Path::new(&config.source_root),
                raw_root: &config.raw_root(),
                cache_root: &config.cache_root(),
                extensions: &config.source_extensions,
                includes: &config.includes,
                ignores: &config.ignores,
            })?;
            report::print_extract(&summary, cmd.common.verbose);
            Ok(status_from_warnings(&summary.warnings))
        }
        Command::Diff(cmd) => {
            let summary = diff::run(&diff::DiffOptions {
                raw_root: &config.raw_root(),
                translated_root: &config.translated_root(),
                diff_root: &config.diff_root(),
            })?;
            report::print_diff(&summary, cmd.common.verbose);
            Ok(status_from_warnings(&summary.warnings))
        }
        Command::Translate(cmd) => {
            let summary = run_translate(&config, &cmd)?;
            report::print_translate(&summary);
            if summary.complete && summary.failures.is_empty() {
                Ok(ExitStatus::Success)
            } else {
                Ok(ExitStatus::Failure)
            }
        }
        Command::Status(cmd) => {
            let statuses =
                translate::status(&config.diff_root(), &config.diff_translated_root())?;
            report::print_status(&statuses, cmd.common.verbose);
            let missing = statuses
                .iter()
                .any(|s| s.translated_rows < s.pending_rows);
            Ok(if missing {
                ExitStatus::Failure
            } else {
                ExitStatus::Success
            })
        }
        Command::Merge(cmd) => {
            let summary = merge::run(&merge::MergeOptions {
                source_root: &config.diff_translated_root(),
                target_root: &config.translated_root(),
            })?;
            report::print_merge(&summary, cmd.common.verbose);
            Ok(status_from_warnings(&summary.warnings))
        }
        Command::Init => anyhow::bail!("Init command is handled before config resolution"),
    }
}

fn run_translate(config: &Config, cmd: &TranslateCommand) -> Result<TranslateSummary> {
    let backend = PassthroughBackend::new(&config.model);
    let store = FileCheckpointStore::new(config.checkpoint_path());
    let translator = BatchTranslator::new(&backend, &HeuristicCounter, &store);
    let options = TranslateOptions {
        diff_root: &config.diff_root(),
        output_root: &config.diff_translated_root(),
        token_budget: cmd.budget.unwrap_or(config.token_budget),
        output_amplification: config.output_amplification,
    };

    if cmd.single_batch {
        let report = translator.run_batch(&options)?;
        Ok(TranslateSummary {
            rows_translated: report.rows_translated,
            tokens_used: report.tokens_used,
            invocations: 1,
            failures: report.failures,
            complete: !report.paused,
        })
    } else {
        translator.run_to_completion(&options)
    }
}

fn resolve_config(command: &Command) -> Result<Config> {
    let cwd = env::current_dir()?;
    let mut config = load_config(&cwd)?.config;

    if let Some(common) = common_args(command) {
        if let Some(source_root) = &common.source_root {
            config.source_root = source_root.display().to_string();
        }
        if let Some(dicts_root) = &common.dicts_root {
            config.dicts_root = dicts_root.display().to_string();
        }
        if let Some(lang) = &common.lang {
            config.language = lang.clone();
        }
    }
    if let Command::Translate(cmd) = command
        && let Some(model) = &cmd.model
    {
        config.model = model.clone();
    }

    config.validate()?;
    Ok(config)
}

fn common_args(command: &Command) -> Option<&CommonArgs> {
    match command {
        Command::Extract(cmd) => Some(&cmd.common),
        Command::Diff(cmd) => Some(&cmd.common),
        Command::Translate(cmd) => Some(&cmd.common),
        Command::Status(cmd) => Some(&cmd.common),
        Command::Merge(cmd) => Some(&cmd.common),
        Command::Init => None,
    }
}

fn status_from_warnings(warnings: &[String]) -> ExitStatus {
    if warnings.is_empty() {
        ExitStatus::Success
    } else {
        ExitStatus::Failure
    }
}

fn init() -> Result<()> {
    let config_path = Path::new(CONFIG_FILE_NAME);
    if config_path.exists() {
        anyhow::bail!("{} already exists", CONFIG_FILE_NAME);
    }

    fs::write(config_path, default_config_json()?)?;
    Ok(())
}
