//! dtsdoc CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;
use dtsdoc_cli::Cli;
use dtsdoc_cli::error::exit_code_from_error;
use dtsdoc_cli::utils::initialize_logging;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = initialize_logging(&cli) {
        eprintln!("failed to initialize logging: {e}");
    }

    match dtsdoc_cli::run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {err:#}", "error:".red().bold());
            ExitCode::from(exit_code_from_error(&err))
        },
    }
}
