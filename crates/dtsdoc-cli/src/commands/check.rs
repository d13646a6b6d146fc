//! `dtsdoc check`: inspect a cache entry without fetching.

use std::io::Write;

use anyhow::Result;
use dtsdoc_core::{CacheStore, Lookup, Renderer, normalize_identifier};

use crate::error::CliError;
use crate::output::write_json;

/// Print the cached entry for `api_path` as JSON, or the reason it missed.
///
/// A miss is not an error.
///
/// # Errors
///
/// Returns an error for a path that names no class, or if output fails.
pub fn execute<D: Renderer, W: Write>(
    store: &CacheStore<D>,
    mut writer: W,
    api_path: &str,
    namespace_prefix: &str,
) -> Result<()> {
    let identifier = normalize_identifier(api_path, namespace_prefix).map_err(CliError::from)?;
    match store.lookup(&identifier, false).map_err(CliError::from)? {
        Lookup::Hit(doc) => write_json(writer, &doc),
        Lookup::Miss(reason) => {
            writeln!(writer, "Cache miss for {identifier} ({reason})")?;
            Ok(())
        },
    }
}
