//! `dtsdoc list`: show cached classes.

use std::io::Write;

use anyhow::Result;
use colored::Colorize;
use dtsdoc_core::{CacheStore, Lookup, Renderer};
use serde::Serialize;

use crate::output::write_json;

/// One row of `dtsdoc list`.
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ListEntry {
    /// Cache identifier.
    pub identifier: String,
    /// `fresh`, `expired` or `unreadable entry`.
    pub status: String,
}

/// Collect the cached identifiers with their freshness.
///
/// # Errors
///
/// Returns an error if the cache directory cannot be read.
pub fn collect<D: Renderer>(store: &CacheStore<D>) -> Result<Vec<ListEntry>> {
    let mut entries = Vec::new();
    for identifier in store.list()? {
        let status = match store.lookup(&identifier, false)? {
            Lookup::Hit(_) => "fresh".to_string(),
            Lookup::Miss(reason) => reason.to_string(),
        };
        entries.push(ListEntry { identifier, status });
    }
    Ok(entries)
}

/// Print the cache listing.
///
/// # Errors
///
/// Returns an error if the cache cannot be read or output fails.
pub fn execute<D: Renderer, W: Write>(
    store: &CacheStore<D>,
    mut writer: W,
    json: bool,
) -> Result<()> {
    let entries = collect(store)?;

    if json {
        return write_json(writer, &entries);
    }

    if entries.is_empty() {
        writeln!(writer, "{} No cached classes", "ℹ".blue())?;
        return Ok(());
    }

    for entry in &entries {
        if entry.status == "fresh" {
            writeln!(writer, "{}", entry.identifier)?;
        } else {
            let status = format!("({})", entry.status);
            writeln!(writer, "{} {}", entry.identifier, status.as_str().dimmed())?;
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, Utc};
    use dtsdoc_core::DocumentRecord;
    use tempfile::TempDir;

    #[test]
    fn test_collect_reports_freshness() -> Result<()> {
        let temp = TempDir::new()?;
        let store = CacheStore::open(temp.path(), TimeDelta::days(7))?;
        store.store("Polygon", DocumentRecord::new("Polygon"))?;
        store.store_at(
            "Marker",
            DocumentRecord::new("Marker"),
            Utc::now() - TimeDelta::days(8),
        )?;

        let entries = collect(&store)?;
        assert_eq!(
            entries,
            vec![
                ListEntry {
                    identifier: "Marker".into(),
                    status: "expired".into(),
                },
                ListEntry {
                    identifier: "Polygon".into(),
                    status: "fresh".into(),
                },
            ]
        );
        Ok(())
    }

    #[test]
    fn test_empty_cache_text() -> Result<()> {
        colored::control::set_override(false);
        let temp = TempDir::new()?;
        let store = CacheStore::open(temp.path(), TimeDelta::days(7))?;
        let mut out = Vec::new();
        execute(&store, &mut out, false)?;
        assert_eq!(String::from_utf8(out).unwrap(), "ℹ No cached classes\n");
        Ok(())
    }
}
