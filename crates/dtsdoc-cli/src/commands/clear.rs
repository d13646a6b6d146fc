//! `dtsdoc clear`: drop one cache entry or the whole cache.

use std::io::{self, Write};

use anyhow::Result;
use colored::Colorize;
use dtsdoc_core::{CacheStore, Invalidate, Renderer, normalize_identifier};

use crate::error::CliError;

/// Storage operations needed by the clear command.
pub trait ClearStorage {
    /// Cached identifiers.
    fn list_entries(&self) -> Result<Vec<String>>;
    /// Remove everything, returning how many entries were removed.
    fn clear_all(&self) -> Result<usize>;
}

impl<D: Renderer> ClearStorage for CacheStore<D> {
    fn list_entries(&self) -> Result<Vec<String>> {
        Ok(self.list().map_err(CliError::from)?.into_iter().collect())
    }

    fn clear_all(&self) -> Result<usize> {
        Ok(self.invalidate(Invalidate::All).map_err(CliError::from)?)
    }
}

/// Outcome of [`execute_clear`].
#[derive(Debug, PartialEq, Eq)]
pub enum ClearOutcome {
    /// Nothing was cached.
    AlreadyEmpty,
    /// The user declined the prompt.
    Cancelled,
    /// Cache cleared.
    Cleared {
        /// Entries removed.
        cleared: usize,
    },
}

/// Clear the whole cache, asking `confirm` first unless `force` is set.
///
/// # Errors
///
/// Returns an error if listing, confirmation or deletion fails.
pub fn execute_clear<S, W, C>(
    storage: &S,
    mut writer: W,
    force: bool,
    mut confirm: C,
) -> Result<ClearOutcome>
where
    S: ClearStorage,
    W: Write,
    C: FnMut(&[String]) -> Result<bool>,
{
    let entries = storage.list_entries()?;

    if entries.is_empty() {
        writeln!(writer, "{} Cache is already empty", "ℹ".blue())?;
        return Ok(ClearOutcome::AlreadyEmpty);
    }

    writeln!(
        writer,
        "{} This will delete {} cached class(es):",
        "⚠".yellow(),
        entries.len()
    )?;
    for entry in &entries {
        writeln!(writer, "  • {entry}")?;
    }
    writeln!(writer)?;

    if !force && !confirm(&entries)? {
        writeln!(writer, "{} Cancelled", "✗".red())?;
        return Ok(ClearOutcome::Cancelled);
    }

    let cleared = storage.clear_all()?;
    writeln!(writer, "{} Cache cleared", "✓".green())?;
    Ok(ClearOutcome::Cleared { cleared })
}

/// Remove the entry for one API path.
///
/// # Errors
///
/// Returns an error for a path that names no class or a failed removal.
pub fn execute_entry<D: Renderer, W: Write>(
    store: &CacheStore<D>,
    mut writer: W,
    api_path: &str,
    namespace_prefix: &str,
) -> Result<usize> {
    let identifier = normalize_identifier(api_path, namespace_prefix).map_err(CliError::from)?;
    let removed = store
        .invalidate(Invalidate::Entry(identifier.clone()))
        .map_err(CliError::from)?;
    if removed == 0 {
        writeln!(writer, "{} {identifier} is not cached", "ℹ".blue())?;
    } else {
        writeln!(writer, "{} Cleared {identifier}", "✓".green())?;
    }
    Ok(removed)
}

/// Run `dtsdoc clear` against the real store and terminal.
///
/// # Errors
///
/// Returns an error if the cache cannot be cleared or the prompt fails.
pub fn run<D: Renderer>(
    store: &CacheStore<D>,
    api_path: Option<&str>,
    namespace_prefix: &str,
    force: bool,
) -> Result<()> {
    let stdout = io::stdout();
    let mut stdout_lock = stdout.lock();

    if let Some(api_path) = api_path {
        execute_entry(store, &mut stdout_lock, api_path, namespace_prefix)?;
        return Ok(());
    }

    let mut input = String::new();
    execute_clear(store, &mut stdout_lock, force, |_entries| {
        let mut prompt = io::stdout();
        write!(prompt, "Are you sure you want to continue? [y/N] ")?;
        prompt.flush()?;

        input.clear();
        io::stdin().read_line(&mut input)?;

        Ok(matches!(
            input.trim().to_ascii_lowercase().as_str(),
            "y" | "yes"
        ))
    })?;

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use dtsdoc_core::DocumentRecord;
    use std::cell::RefCell;
    use tempfile::TempDir;

    #[derive(Default)]
    struct MockStorage {
        entries: Vec<String>,
        cleared: RefCell<bool>,
    }

    impl ClearStorage for MockStorage {
        fn list_entries(&self) -> Result<Vec<String>> {
            Ok(self.entries.clone())
        }

        fn clear_all(&self) -> Result<usize> {
            *self.cleared.borrow_mut() = true;
            Ok(self.entries.len())
        }
    }

    #[test]
    fn execute_clear_reports_empty_cache() -> Result<()> {
        let storage = MockStorage::default();
        let mut output = Vec::new();

        let outcome = execute_clear(&storage, &mut output, false, |_| Ok(true))?;

        assert_eq!(outcome, ClearOutcome::AlreadyEmpty);
        assert!(String::from_utf8(output)?.contains("Cache is already empty"));
        Ok(())
    }

    #[test]
    fn execute_clear_skips_confirmation_when_forced() -> Result<()> {
        let storage = MockStorage {
            entries: vec!["Marker".into(), "Polygon".into()],
            cleared: RefCell::new(false),
        };
        let mut output = Vec::new();

        let outcome = execute_clear(&storage, &mut output, true, |_| {
            anyhow::bail!("confirmation should not be requested when forced");
        })?;

        assert_eq!(outcome, ClearOutcome::Cleared { cleared: 2 });
        assert!(*storage.cleared.borrow());
        assert!(String::from_utf8(output)?.contains("Cache cleared"));
        Ok(())
    }

    #[test]
    fn execute_clear_honours_cancellation() -> Result<()> {
        let storage = MockStorage {
            entries: vec!["Marker".into()],
            cleared: RefCell::new(false),
        };
        let mut output = Vec::new();

        let outcome = execute_clear(&storage, &mut output, false, |entries| {
            assert_eq!(entries, ["Marker".to_string()]);
            Ok(false)
        })?;

        assert_eq!(outcome, ClearOutcome::Cancelled);
        assert!(!*storage.cleared.borrow());
        assert!(String::from_utf8(output)?.contains("Cancelled"));
        Ok(())
    }

    #[test]
    fn execute_clear_empties_real_store() -> Result<()> {
        let temp = TempDir::new()?;
        let store = CacheStore::open(temp.path(), TimeDelta::days(7))?;
        store.store("Marker", DocumentRecord::new("Marker"))?;
        store.store("Polygon", DocumentRecord::new("Polygon"))?;

        let outcome = execute_clear(&store, Vec::new(), false, |_| Ok(true))?;

        assert_eq!(outcome, ClearOutcome::Cleared { cleared: 2 });
        assert!(store.list()?.is_empty());
        Ok(())
    }

    #[test]
    fn execute_entry_removes_only_that_class() -> Result<()> {
        let temp = TempDir::new()?;
        let store = CacheStore::open(temp.path(), TimeDelta::days(7))?;
        store.store("Marker", DocumentRecord::new("Marker"))?;
        store.store("Polygon", DocumentRecord::new("Polygon"))?;

        assert_eq!(execute_entry(&store, Vec::new(), "acApi.marker", "acApi")?, 1);
        assert_eq!(execute_entry(&store, Vec::new(), "acApi.marker", "acApi")?, 0);
        assert_eq!(store.list()?.into_iter().collect::<Vec<_>>(), ["Polygon"]);
        Ok(())
    }
}
