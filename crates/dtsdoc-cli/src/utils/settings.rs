//! Resolve configuration and build the documentation client.

use anyhow::{Context, Result};
use dtsdoc_core::{CacheStore, Config, DocsClient, HttpRetriever};
use tracing::debug;

use crate::cli::Cli;
use crate::error::CliError;

/// Client type used by the CLI.
pub type Client = DocsClient<HttpRetriever>;

/// Load configuration, layering `--config`, environment and flag overrides.
///
/// # Errors
///
/// Returns a usage error if the config file is unreadable or the final
/// values are invalid.
pub fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            let mut config = Config::load_from(path).map_err(CliError::from)?;
            config.apply_env_overrides(|key| std::env::var(key).ok());
            config
        },
        None => Config::load().map_err(CliError::from)?,
    };

    apply_flag_overrides(&mut config, cli);
    config.validate().map_err(CliError::from)?;
    debug!(
        "cache root {}, base url {}",
        config.cache.root.display(),
        config.source.base_url
    );
    Ok(config)
}

fn apply_flag_overrides(config: &mut Config, cli: &Cli) {
    if let Some(dir) = &cli.cache_dir {
        config.cache.root.clone_from(dir);
    }
    if let Some(url) = &cli.base_url {
        config.source.base_url.clone_from(url);
    }
}

/// Open the cache store named by `config`.
///
/// # Errors
///
/// Returns an error if the cache directories cannot be created.
pub fn open_store(config: &Config) -> Result<CacheStore> {
    CacheStore::open(&config.cache.root, config.cache.ttl())
        .map_err(CliError::from)
        .with_context(|| format!("Failed to open cache at {}", config.cache.root.display()))
}

/// Build a client with an HTTP retriever.
///
/// # Errors
///
/// Returns an error if the cache or the HTTP client cannot be initialized.
pub fn build_client(config: &Config) -> Result<Client> {
    let store = open_store(config)?;
    let retriever = HttpRetriever::new(config.fetch.timeout(), config.fetch.retry_policy())
        .map_err(CliError::from)?;
    Ok(DocsClient::new(
        store,
        retriever,
        config.source.base_url.clone(),
        config.source.namespace_prefix.clone(),
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::path::PathBuf;

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::try_parse_from([
            "dtsdoc",
            "list",
            "--cache-dir",
            "/tmp/dtsdoc-flag",
            "--base-url",
            "http://127.0.0.1:9/api/",
        ])
        .unwrap();
        let mut config = Config::default();
        apply_flag_overrides(&mut config, &cli);
        assert_eq!(config.cache.root, PathBuf::from("/tmp/dtsdoc-flag"));
        assert_eq!(config.source.base_url, "http://127.0.0.1:9/api/");
    }

    #[test]
    fn test_missing_explicit_config_is_usage_error() {
        let cli = Cli::try_parse_from(["dtsdoc", "list", "--config", "/nonexistent/dtsdoc.toml"])
            .unwrap();
        let err = load_config(&cli).unwrap_err();
        assert_eq!(crate::error::exit_code_from_error(&err), 2);
    }
}
