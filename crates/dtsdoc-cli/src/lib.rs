//! dtsdoc CLI - cached lookups of JSDoc API reference pages
//!
//! The binary in `main.rs` parses arguments, installs logging and hands the
//! parsed [`Cli`] to [`run`]. Exit codes come from [`error::exit_code_from_error`].

use anyhow::Result;

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;
pub mod utils;

pub use cli::{Cli, Commands};

use crate::utils::{load_config, open_store};

/// Execute one parsed command.
///
/// # Errors
///
/// Returns the command's error; wrap it with [`error::exit_code_from_error`]
/// to get the process exit code.
pub fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Parse { file } => commands::parse::execute(file, std::io::stdout().lock()),
        Commands::Links { file } => commands::parse::links(file, std::io::stdout().lock()),
        Commands::Query(args) => {
            let config = load_config(cli)?;
            commands::query::execute(args, &config, cli.quiet)
        },
        Commands::List { json } => {
            let config = load_config(cli)?;
            let store = open_store(&config)?;
            commands::list::execute(&store, std::io::stdout().lock(), *json)
        },
        Commands::Check { api_path } => {
            let config = load_config(cli)?;
            let store = open_store(&config)?;
            commands::check::execute(
                &store,
                std::io::stdout().lock(),
                api_path,
                &config.source.namespace_prefix,
            )
        },
        Commands::Clear { api_path, force } => {
            let config = load_config(cli)?;
            let store = open_store(&config)?;
            commands::clear::run(
                &store,
                api_path.as_deref(),
                &config.source.namespace_prefix,
                *force,
            )
        },
    }
}
