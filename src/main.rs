use std::process::ExitCode;

use clap::Parser;
use tweeloc::cli::{Arguments, ExitStatus};
use tweeloc::report;

fn main() -> ExitCode {
    let args = Arguments::parse();

    match tweeloc::cli::run_cli(args) {
        Ok(status) => status.into(),
        Err(err) => {
            report::print_error(&format!("{err:#}"));
            ExitStatus::Error.into()
        }
    }
}
