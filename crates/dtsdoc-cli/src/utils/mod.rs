//! Shared helpers for CLI commands.
//!
//! - [`logging`]: tracing subscriber and color setup
//! - [`settings`]: configuration layering and client construction

pub mod logging;
pub mod settings;

pub use logging::initialize_logging;
pub use settings::{build_client, load_config, open_store};
