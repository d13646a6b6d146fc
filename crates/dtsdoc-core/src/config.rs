//! Configuration for the documentation client.
//!
//! Configuration is stored in TOML. Every section and key is optional, so a
//! file only needs the values it changes:
//!
//! ```toml
//! [source]
//! base_url = "https://sdk.freedo3d.com/doc/api/"
//! namespace_prefix = "acApi"
//!
//! [cache]
//! root = "/home/user/.cache/dtsdoc"
//! ttl_days = 7
//!
//! [fetch]
//! timeout_secs = 30
//! max_attempts = 4
//! backoff_base_ms = 1000
//! backoff_max_ms = 8000
//!
//! [output]
//! dir = "/home/user/DTS-Docs"
//! save_docs = true
//! ```
//!
//! ## Lookup order
//!
//! 1. The file named by `DTSDOC_CONFIG`, if set
//! 2. `config.toml` in the platform config directory
//! 3. Built-in defaults
//!
//! `DTSDOC_CACHE_DIR` and `DTSDOC_BASE_URL` override the loaded values.
//!
//! ```rust
//! use dtsdoc_core::Config;
//!
//! let config: Config = toml::from_str("[cache]\nttl_days = 3")?;
//! assert_eq!(config.cache.ttl_days, 3);
//! assert_eq!(config.fetch.max_attempts, 4);
//! # Ok::<(), toml::de::Error>(())
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::fetcher::RetryPolicy;
use crate::identifier::DEFAULT_NAMESPACE_PREFIX;
use crate::{Error, Result};

/// Documentation site used when none is configured.
pub const DEFAULT_BASE_URL: &str = "https://sdk.freedo3d.com/doc/api/";

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "DTSDOC_CONFIG";
/// Environment variable overriding the cache root.
pub const CACHE_DIR_ENV: &str = "DTSDOC_CACHE_DIR";
/// Environment variable overriding the documentation base URL.
pub const BASE_URL_ENV: &str = "DTSDOC_BASE_URL";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where documentation pages come from.
    pub source: SourceConfig,
    /// Local cache settings.
    pub cache: CacheConfig,
    /// HTTP retrieval settings.
    pub fetch: FetchConfig,
    /// Saved markdown output.
    pub output: OutputConfig,
}

/// Documentation origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Base URL that `<Identifier>.html` is resolved against.
    pub base_url: String,
    /// Namespace segment dropped from API paths.
    pub namespace_prefix: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            namespace_prefix: DEFAULT_NAMESPACE_PREFIX.to_string(),
        }
    }
}

/// Cache location and lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache root directory.
    pub root: PathBuf,
    /// Days before an entry expires.
    pub ttl_days: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            root: default_cache_root(),
            ttl_days: 7,
        }
    }
}

impl CacheConfig {
    /// Entry time-to-live.
    #[must_use]
    pub fn ttl(&self) -> TimeDelta {
        TimeDelta::try_days(i64::from(self.ttl_days)).unwrap_or(TimeDelta::MAX)
    }
}

/// Retrieval timeout and retry budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Attempts per page, the first included.
    pub max_attempts: u32,
    /// First retry delay in milliseconds.
    pub backoff_base_ms: u64,
    /// Maximum retry delay in milliseconds.
    pub backoff_max_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_attempts: 4,
            backoff_base_ms: 1_000,
            backoff_max_ms: 8_000,
        }
    }
}

impl FetchConfig {
    /// Per-request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Retry policy for the HTTP retriever.
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            backoff_base: Duration::from_millis(self.backoff_base_ms),
            backoff_max: Duration::from_millis(self.backoff_max_ms),
        }
    }
}

/// Where rendered markdown is saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output directory.
    pub dir: PathBuf,
    /// Whether queries save markdown by default.
    pub save_docs: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: directories::BaseDirs::new().map_or_else(
                || PathBuf::from("DTS-Docs"),
                |base| base.home_dir().join("DTS-Docs"),
            ),
            save_docs: true,
        }
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("dev", "dtsdoc", "dtsdoc")
}

fn default_cache_root() -> PathBuf {
    project_dirs().map_or_else(
        || {
            directories::BaseDirs::new().map_or_else(
                || PathBuf::from(".dtsdoc/cache"),
                |base| base.home_dir().join(".dtsdoc").join("cache"),
            )
        },
        |dirs| dirs.cache_dir().to_path_buf(),
    )
}

impl Config {
    /// Load from the default location, then apply environment overrides.
    ///
    /// A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file exists but cannot be read or
    /// parsed, or the result fails validation.
    pub fn load() -> Result<Self> {
        let path = match std::env::var_os(CONFIG_ENV) {
            Some(path) if !path.is_empty() => Some(PathBuf::from(path)),
            _ => Self::default_path(),
        };

        let mut config = match path {
            Some(path) if path.exists() => Self::load_from(&path)?,
            _ => Self::default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load from an explicit file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config {}: {e}", path.display())))?;
        let config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config {}: {e}", path.display())))?;
        debug!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Write to `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file cannot be written.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("Failed to create config directory: {e}")))?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {e}")))?;
        fs::write(path, content)
            .map_err(|e| Error::Config(format!("Failed to write config: {e}")))?;
        Ok(())
    }

    /// Platform config file location.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Apply overrides from an environment lookup.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup(CACHE_DIR_ENV).filter(|v| !v.trim().is_empty()) {
            self.cache.root = PathBuf::from(dir.trim());
        }
        if let Some(url) = lookup(BASE_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.source.base_url = url.trim().to_string();
        }
    }

    /// Check values that would otherwise fail later in confusing ways.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] describing the first invalid value.
    pub fn validate(&self) -> Result<()> {
        let base = url::Url::parse(&self.source.base_url).map_err(|e| {
            Error::Config(format!("source.base_url '{}' is invalid: {e}", self.source.base_url))
        })?;
        if base.cannot_be_a_base() {
            return Err(Error::Config(format!(
                "source.base_url '{}' cannot be used as a base URL",
                self.source.base_url
            )));
        }
        if self.cache.ttl_days == 0 {
            return Err(Error::Config("cache.ttl_days must be at least 1".into()));
        }
        if self.fetch.max_attempts == 0 {
            return Err(Error::Config("fetch.max_attempts must be at least 1".into()));
        }
        if self.fetch.timeout_secs == 0 {
            return Err(Error::Config("fetch.timeout_secs must be at least 1".into()));
        }
        Ok(())
    }
}
