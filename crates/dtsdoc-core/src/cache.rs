//! Local cache of extracted document records.
//!
//! Layout under the cache root:
//!
//! ```text
//! parsed/<Identifier>.json      one CachedDocument per class
//! raw/<sha256(locator)>.html    raw markup, used when the origin is unreachable
//! ```
//!
//! Every write goes through a temporary file in the target directory followed
//! by a rename, so a reader sees either the previous entry or the new one.
//! Concurrent writers of the same identifier race and the last rename wins.
//!
//! Entries expire `ttl` after `fetchedAt`. Expiry is checked before anything
//! else, and an expired entry is reported as a miss but left on disk until it
//! is overwritten or invalidated. A fresh entry that predates the current
//! schema is upgraded in place ("backfilled") from its stored fields.

use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::fs;
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeDelta, Utc};
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::identifier::is_valid_identifier;
use crate::render::{MarkdownRenderer, Renderer, render_views};
use crate::types::{CachedDocument, DocumentRecord};
use crate::{Error, Result};

/// Schema version stamped on every entry this store writes.
pub const CURRENT_SCHEMA_VERSION: &str = "2.0";

/// Default time-to-live for entries.
pub const DEFAULT_TTL_DAYS: i64 = 7;

const PARSED_DIR: &str = "parsed";
const RAW_DIR: &str = "raw";
const ENTRY_EXTENSION: &str = "json";

/// Result of [`CacheStore::lookup`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// A fresh entry, backfilled if that was requested and needed.
    Hit(CachedDocument),
    /// No usable entry.
    Miss(MissReason),
}

impl Lookup {
    /// The entry on a hit.
    #[must_use]
    pub fn into_hit(self) -> Option<CachedDocument> {
        match self {
            Self::Hit(doc) => Some(doc),
            Self::Miss(_) => None,
        }
    }
}

/// Why a lookup missed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissReason {
    /// No entry for the identifier.
    Absent,
    /// The entry is older than the store's ttl.
    Expired,
    /// The entry could not be read or parsed.
    Corrupt,
}

impl std::fmt::Display for MissReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::Absent => "not cached",
            Self::Expired => "expired",
            Self::Corrupt => "unreadable entry",
        };
        f.write_str(text)
    }
}

/// What [`CacheStore::invalidate`] removes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invalidate {
    /// The entry for one identifier.
    Entry(String),
    /// Every entry and all raw markup.
    All,
}

/// Whether an entry fetched at `fetched_at` is still fresh at `now`.
///
/// An entry exactly `ttl` old is still fresh.
#[must_use]
pub fn is_fresh_at(fetched_at: DateTime<Utc>, now: DateTime<Utc>, ttl: TimeDelta) -> bool {
    now.signed_duration_since(fetched_at) <= ttl
}

/// Whether an entry lacks the rendered views of the current schema.
#[must_use]
pub fn needs_backfill(entry: &CachedDocument) -> bool {
    entry.rendered_views.is_none() || entry.schema_version.as_deref() != Some(CURRENT_SCHEMA_VERSION)
}

/// Filesystem-backed cache of [`CachedDocument`]s.
#[derive(Debug, Clone)]
pub struct CacheStore<D = MarkdownRenderer> {
    root: PathBuf,
    ttl: TimeDelta,
    renderer: D,
}

impl CacheStore {
    /// Open (and create) a store rooted at `root`, rendering with the
    /// default markdown renderer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] if the directories cannot be created.
    pub fn open(root: impl Into<PathBuf>, ttl: TimeDelta) -> Result<Self> {
        Self::with_renderer(root, ttl, MarkdownRenderer::default())
    }
}

impl<D: Renderer> CacheStore<D> {
    /// Open a store that renders views with `renderer`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] if the directories cannot be created.
    pub fn with_renderer(root: impl Into<PathBuf>, ttl: TimeDelta, renderer: D) -> Result<Self> {
        let root = root.into();
        for dir in [root.join(PARSED_DIR), root.join(RAW_DIR)] {
            fs::create_dir_all(&dir).map_err(|e| {
                Error::Storage(format!("Failed to create cache directory {}: {e}", dir.display()))
            })?;
        }
        debug!("cache store at {}", root.display());
        Ok(Self {
            root,
            ttl,
            renderer,
        })
    }

    /// Cache root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn parsed_dir(&self) -> PathBuf {
        self.root.join(PARSED_DIR)
    }

    fn raw_dir(&self) -> PathBuf {
        self.root.join(RAW_DIR)
    }

    /// Path of the entry file for `identifier`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIdentifier`] for identifiers that are not safe
    /// file stems.
    pub fn entry_path(&self, identifier: &str) -> Result<PathBuf> {
        if !is_valid_identifier(identifier) {
            return Err(Error::InvalidIdentifier(format!(
                "'{identifier}' is not a valid cache key"
            )));
        }
        Ok(self
            .parsed_dir()
            .join(format!("{identifier}.{ENTRY_EXTENSION}")))
    }

    /// Look up `identifier` as of now.
    ///
    /// # Errors
    ///
    /// Only an invalid identifier is an error; unreadable entries are misses.
    pub fn lookup(&self, identifier: &str, want_rendered: bool) -> Result<Lookup> {
        self.lookup_at(identifier, want_rendered, Utc::now())
    }

    /// Look up `identifier` as of `now`.
    ///
    /// # Errors
    ///
    /// See [`CacheStore::lookup`].
    pub fn lookup_at(
        &self,
        identifier: &str,
        want_rendered: bool,
        now: DateTime<Utc>,
    ) -> Result<Lookup> {
        let path = self.entry_path(identifier)?;

        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("cache miss for {identifier}: absent");
                return Ok(Lookup::Miss(MissReason::Absent));
            },
            Err(e) => {
                warn!("cache entry {} unreadable: {e}", path.display());
                return Ok(Lookup::Miss(MissReason::Corrupt));
            },
        };

        let entry: CachedDocument = match serde_json::from_str(&contents) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("cache entry {} is corrupt: {e}", path.display());
                return Ok(Lookup::Miss(MissReason::Corrupt));
            },
        };

        if !is_fresh_at(entry.fetched_at, now, self.ttl) {
            debug!("cache miss for {identifier}: fetched {} is expired", entry.fetched_at);
            return Ok(Lookup::Miss(MissReason::Expired));
        }

        if want_rendered && needs_backfill(&entry) {
            info!(
                "backfilling {identifier} from schema {}",
                entry.schema_version.as_deref().unwrap_or("1.0")
            );
            let upgraded = self.backfill(entry);
            if let Err(e) = self.write_entry(&path, &upgraded) {
                warn!("failed to persist backfilled entry for {identifier}: {e}");
            }
            return Ok(Lookup::Hit(upgraded));
        }

        debug!("cache hit for {identifier}");
        Ok(Lookup::Hit(entry))
    }

    /// Regenerate rendered views and stamp the current schema version.
    ///
    /// The extracted fields and `fetchedAt` are left as they are.
    #[must_use]
    pub fn backfill(&self, mut entry: CachedDocument) -> CachedDocument {
        entry.rendered_views = Some(render_views(&self.renderer, &entry.record));
        entry.schema_version = Some(CURRENT_SCHEMA_VERSION.to_string());
        entry
    }

    /// Store `record` under `identifier`, fetched now.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid identifier or a failed write.
    pub fn store(&self, identifier: &str, record: DocumentRecord) -> Result<CachedDocument> {
        self.store_at(identifier, record, Utc::now())
    }

    /// Store `record` under `identifier` with `fetchedAt = now`.
    ///
    /// # Errors
    ///
    /// See [`CacheStore::store`].
    pub fn store_at(
        &self,
        identifier: &str,
        record: DocumentRecord,
        now: DateTime<Utc>,
    ) -> Result<CachedDocument> {
        let path = self.entry_path(identifier)?;
        let entry = self.backfill(CachedDocument {
            record,
            fetched_at: now,
            schema_version: None,
            rendered_views: None,
        });
        self.write_entry(&path, &entry)?;
        debug!(
            "stored {identifier} ({} methods) at {}",
            entry.record.methods.len(),
            path.display()
        );
        Ok(entry)
    }

    fn write_entry(&self, path: &Path, entry: &CachedDocument) -> Result<()> {
        let json = serde_json::to_string_pretty(entry)
            .map_err(|e| Error::Storage(format!("Failed to serialize cache entry: {e}")))?;
        write_atomic(path, json.as_bytes())
    }

    /// Remove cached entries, returning how many entries were removed.
    ///
    /// # Errors
    ///
    /// Returns an error if a file or directory cannot be removed.
    pub fn invalidate(&self, target: Invalidate) -> Result<usize> {
        match target {
            Invalidate::Entry(identifier) => {
                let path = self.entry_path(&identifier)?;
                match fs::remove_file(&path) {
                    Ok(()) => {
                        info!("cleared cache entry for {identifier}");
                        Ok(1)
                    },
                    Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(0),
                    Err(e) => Err(Error::Storage(format!(
                        "Failed to remove {}: {e}",
                        path.display()
                    ))),
                }
            },
            Invalidate::All => {
                let removed = self.list()?.len();
                for dir in [self.parsed_dir(), self.raw_dir()] {
                    if dir.exists() {
                        fs::remove_dir_all(&dir).map_err(|e| {
                            Error::Storage(format!("Failed to remove {}: {e}", dir.display()))
                        })?;
                    }
                    fs::create_dir_all(&dir).map_err(|e| {
                        Error::Storage(format!("Failed to recreate {}: {e}", dir.display()))
                    })?;
                }
                info!("cleared {removed} cache entries");
                Ok(removed)
            },
        }
    }

    /// Identifiers with an entry on disk, fresh or not.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry directory cannot be read.
    pub fn list(&self) -> Result<BTreeSet<String>> {
        let dir = self.parsed_dir();
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(BTreeSet::new()),
            Err(e) => {
                return Err(Error::Storage(format!(
                    "Failed to read {}: {e}",
                    dir.display()
                )));
            },
        };

        Ok(entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && path.extension().and_then(|ext| ext.to_str()) == Some(ENTRY_EXTENSION)
            })
            .filter_map(|path| {
                path.file_stem()
                    .and_then(|stem| stem.to_str())
                    .map(str::to_string)
            })
            .filter(|stem| is_valid_identifier(stem))
            .collect())
    }

    pub(crate) fn raw_path(&self, locator: &str) -> PathBuf {
        self.raw_dir().join(format!("{}.html", locator_key(locator)))
    }

    /// Previously saved raw markup for `locator`.
    #[must_use]
    pub fn raw_markup(&self, locator: &str) -> Option<String> {
        let path = self.raw_path(locator);
        match fs::read_to_string(&path) {
            Ok(markup) => Some(markup),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!("raw markup {} unreadable: {e}", path.display());
                None
            },
        }
    }

    /// When the raw markup for `locator` was last saved.
    #[must_use]
    pub fn raw_markup_saved_at(&self, locator: &str) -> Option<DateTime<Utc>> {
        let path = self.raw_path(locator);
        fs::metadata(&path)
            .and_then(|meta| meta.modified())
            .map(DateTime::<Utc>::from)
            .map_err(|e| debug!("no save time for {}: {e}", path.display()))
            .ok()
    }

    /// Save raw markup for `locator`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] if the file cannot be written.
    pub fn save_raw_markup(&self, locator: &str, markup: &str) -> Result<()> {
        let path = self.raw_path(locator);
        write_atomic(&path, markup.as_bytes())?;
        debug!("saved raw markup for {locator}");
        Ok(())
    }
}

/// Hex SHA-256 of a locator, used as the raw markup file stem.
#[must_use]
pub fn locator_key(locator: &str) -> String {
    let digest = Sha256::digest(locator.as_bytes());
    digest.iter().fold(String::with_capacity(64), |mut acc, b| {
        // write! to String is infallible
        let _ = write!(acc, "{b:02x}");
        acc
    })
}

fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| Error::Storage(format!("{} has no parent directory", path.display())))?;
    fs::create_dir_all(dir)
        .map_err(|e| Error::Storage(format!("Failed to create {}: {e}", dir.display())))?;

    let mut tmp = NamedTempFile::new_in(dir)
        .map_err(|e| Error::Storage(format!("Failed to create temp file: {e}")))?;
    tmp.write_all(contents)
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| Error::Storage(format!("Failed to write temp file: {e}")))?;
    tmp.persist(path).map_err(|e| {
        Error::Storage(format!("Failed to commit {}: {}", path.display(), e.error))
    })?;
    Ok(())
}
