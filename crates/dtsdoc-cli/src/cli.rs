//! # CLI Structure and Argument Parsing
//!
//! ```bash
//! # Look up a class, or one of its methods
//! dtsdoc query acApi.marker
//! dtsdoc query acApi.marker add --format code-only
//! dtsdoc query acApi.marker.add --json
//!
//! # Inspect and manage the cache
//! dtsdoc list
//! dtsdoc check acApi.marker
//! dtsdoc clear acApi.marker
//! dtsdoc clear --force
//!
//! # Work with local pages
//! dtsdoc parse Marker.html
//! dtsdoc links Marker.html
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use dtsdoc_core::render::Style;

/// Main CLI structure for the `dtsdoc` command
#[derive(Parser, Clone, Debug)]
#[command(name = "dtsdoc")]
#[command(version)]
#[command(about = "dtsdoc - Cached lookups of JSDoc API reference pages", long_about = None)]
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Suppress informational messages (only show errors)
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Path to a config file
    #[arg(long, global = true, value_name = "FILE", env = "DTSDOC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Cache root directory
    #[arg(long, global = true, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Documentation base URL
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Look up a class or method, fetching and caching the page on a miss
    Query(QueryArgs),

    /// List cached classes
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the cached entry for a class without fetching
    Check {
        /// API path, e.g. `acApi.marker`
        api_path: String,
    },

    /// Remove one cached class, or the whole cache
    Clear {
        /// API path of the class to remove; omit to clear everything
        api_path: Option<String>,

        /// Skip the confirmation prompt when clearing everything
        #[arg(short = 'f', long)]
        force: bool,
    },

    /// Extract a local HTML page and print the record as JSON
    Parse {
        /// HTML file
        file: PathBuf,
    },

    /// Print the class names a local HTML page links to
    Links {
        /// HTML file
        file: PathBuf,
    },
}

/// Arguments for `dtsdoc query`
#[derive(Args, Clone, Debug)]
pub struct QueryArgs {
    /// API path, e.g. `acApi.marker` or `acApi.marker.add`
    pub api_path: String,

    /// Method to focus on
    pub method: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = FormatArg::Detailed)]
    pub format: FormatArg,

    /// Output JSON instead of markdown
    #[arg(long)]
    pub json: bool,

    /// Ignore the cache and fetch the page again
    #[arg(long)]
    pub refresh: bool,

    /// Do not save the rendered markdown
    #[arg(long)]
    pub no_save: bool,

    /// Directory for saved markdown
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}

/// Markdown output format.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormatArg {
    /// Everything, examples included
    Detailed,
    /// No examples, short method index
    Compact,
    /// Example code only
    CodeOnly,
}

impl From<FormatArg> for Style {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Detailed => Self::Detailed,
            FormatArg::Compact => Self::Compact,
            FormatArg::CodeOnly => Self::CodeOnly,
        }
    }
}

impl Cli {
    /// Whether the selected command writes machine-readable output.
    #[must_use]
    pub const fn machine_output(&self) -> bool {
        match &self.command {
            Commands::Query(args) => args.json,
            Commands::List { json } => *json,
            Commands::Check { .. } | Commands::Parse { .. } | Commands::Links { .. } => true,
            Commands::Clear { .. } => false,
        }
    }
}
