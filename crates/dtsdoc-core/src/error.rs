//! Error types and handling for dtsdoc-core operations.
//!
//! Every fallible operation in this crate returns [`Result<T>`]. The variants
//! mirror the failure modes of the query pipeline so callers can branch on
//! them without string matching:
//!
//! - **Retrieval**: [`Error::NotFound`] (the origin says the page does not
//!   exist) and [`Error::Transport`] (retrieval failed after bounded retries)
//! - **Extraction**: [`Error::Extraction`] when the markup lacks a mandatory
//!   element
//! - **Focus**: [`Error::MethodNotFound`] when the class exists but the
//!   requested method does not
//! - **Ambient**: I/O, storage, configuration and serialization failures
//!
//! A corrupt cache entry is deliberately absent from this list. The cache
//! store reports it as a miss (see [`crate::cache::MissReason::Corrupt`]).
//!
//! ```rust
//! use dtsdoc_core::{Error, extract::ExtractError};
//!
//! let err = Error::Extraction {
//!     identifier: "Marker".to_string(),
//!     source: ExtractError::MissingClassTitle,
//! };
//! assert_eq!(err.category(), "extraction");
//! assert!(!err.is_recoverable());
//! ```

use thiserror::Error;

use crate::extract::ExtractError;

/// The main error type for dtsdoc-core operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The HTTP client could not be constructed or a request failed outright.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The origin reported that the documentation page does not exist.
    ///
    /// Not retried. Carries the identifier that was attempted so the caller
    /// can suggest a correction.
    #[error("Class '{identifier}' not found (404) at {locator}")]
    NotFound {
        /// Normalized identifier that was queried.
        identifier: String,
        /// Locator that returned 404.
        locator: String,
    },

    /// Retrieval failed after the retriever exhausted its retry budget.
    ///
    /// ## Recoverability
    ///
    /// Transport failures are usually transient; a later invocation may
    /// succeed.
    #[error("Failed to download {locator}: {reason}")]
    Transport {
        /// Locator that could not be retrieved.
        locator: String,
        /// Human readable cause (status code or transport failure).
        reason: String,
    },

    /// Markup is missing a mandatory structural element.
    #[error("Failed to extract '{identifier}': {source}")]
    Extraction {
        /// Identifier whose page failed extraction.
        identifier: String,
        /// What was missing.
        #[source]
        source: ExtractError,
    },

    /// The class was found but has no method with the requested name.
    #[error("Method '{method}' not found in {identifier}")]
    MethodNotFound {
        /// Class identifier that was searched.
        identifier: String,
        /// Method name that was requested.
        method: String,
    },

    /// An API path could not be turned into a cache identifier.
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// A configured base URL or locator is malformed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Cache storage operation failed.
    ///
    /// Covers directory creation, atomic writes and deletion. Reads of a
    /// single entry never surface this; they degrade to a miss.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration is invalid or inaccessible.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl Error {
    /// Check if the error might be recoverable by trying again later.
    ///
    /// Returns `true` for transport failures, network timeouts/connection
    /// errors, and interrupted I/O. Missing classes, missing methods and
    /// extraction failures are permanent for a given page.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Network(e) => e.is_timeout() || e.is_connect(),
            Self::Transport { .. } => true,
            Self::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::Interrupted
            ),
            _ => false,
        }
    }

    /// Get the error category as a stable string identifier.
    ///
    /// Useful for structured logging and for mapping to exit codes.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::Network(_) | Self::Transport { .. } => "network",
            Self::NotFound { .. } => "not_found",
            Self::MethodNotFound { .. } => "method_not_found",
            Self::Extraction { .. } => "extraction",
            Self::InvalidIdentifier(_) => "invalid_identifier",
            Self::InvalidUrl(_) => "invalid_url",
            Self::Storage(_) => "storage",
            Self::Config(_) => "config",
            Self::Serialization(_) => "serialization",
        }
    }
}

/// Convenience type alias for `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
