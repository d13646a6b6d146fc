//! CLI error handling with semantic exit codes.
//!
//! | Code | Category | Description |
//! |------|----------|-------------|
//! | 0 | Success | Command completed successfully (a cache miss on `check` included) |
//! | 1 | `Internal` | Unexpected/internal error |
//! | 2 | `Usage` | Invalid arguments or configuration |
//! | 3 | `NotFound` | Class page or method not found |
//! | 4 | `InvalidQuery` | API path does not name a class |
//! | 5 | `Network` | Page could not be retrieved |
//! | 6 | `Timeout` | Retrieval timed out |
//! | 7 | `Integrity` | Page markup could not be extracted |
//!
//! ```bash
//! dtsdoc query acApi.ghost
//! case $? in
//!     0) echo "Success" ;;
//!     3) echo "No such class" ;;
//!     5) echo "Offline?" ;;
//! esac
//! ```

use std::fmt;

/// Semantic error category determining the exit code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorCategory {
    /// Unexpected or internal error (exit code 1).
    Internal = 1,
    /// Invalid arguments or configuration (exit code 2).
    Usage = 2,
    /// Requested class or method not found (exit code 3).
    NotFound = 3,
    /// API path that names no class (exit code 4).
    InvalidQuery = 4,
    /// Retrieval failure (exit code 5).
    Network = 5,
    /// Operation timed out (exit code 6).
    Timeout = 6,
    /// Markup that could not be extracted (exit code 7).
    Integrity = 7,
}

impl ErrorCategory {
    /// Get the exit code for this category.
    #[must_use]
    pub const fn exit_code(self) -> u8 {
        self as u8
    }

    /// Get a short description of this error category.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Internal => "internal error",
            Self::Usage => "usage error",
            Self::NotFound => "not found",
            Self::InvalidQuery => "invalid query",
            Self::Network => "network error",
            Self::Timeout => "timeout",
            Self::Integrity => "integrity error",
        }
    }

    /// Category for a core library error.
    #[must_use]
    pub fn from_core(err: &dtsdoc_core::Error) -> Self {
        use dtsdoc_core::Error;

        match err {
            Error::NotFound { .. } | Error::MethodNotFound { .. } => Self::NotFound,
            Error::InvalidIdentifier(_) => Self::InvalidQuery,
            Error::Network(e) if e.is_timeout() => Self::Timeout,
            Error::Network(_) | Error::Transport { .. } => Self::Network,
            Error::Extraction { .. } => Self::Integrity,
            Error::Config(_) | Error::InvalidUrl(_) => Self::Usage,
            Error::Io(e) if e.kind() == std::io::ErrorKind::NotFound => Self::NotFound,
            Error::Io(_) | Error::Storage(_) | Error::Serialization(_) => Self::Internal,
        }
    }

    /// Infer the error category from an error message.
    ///
    /// Fallback for errors that reach `main` without a category.
    #[must_use]
    pub fn infer_from_message(msg: &str) -> Self {
        let msg_lower = msg.to_lowercase();

        if msg_lower.contains("timeout") || msg_lower.contains("timed out") {
            return Self::Timeout;
        }

        if msg_lower.contains("network")
            || msg_lower.contains("connection")
            || msg_lower.contains("failed to download")
        {
            return Self::Network;
        }

        if msg_lower.contains("not found")
            || msg_lower.contains("no such")
            || msg_lower.contains("does not exist")
        {
            return Self::NotFound;
        }

        if msg_lower.contains("invalid identifier") || msg_lower.contains("does not name a class") {
            return Self::InvalidQuery;
        }

        if msg_lower.contains("failed to extract") {
            return Self::Integrity;
        }

        if msg_lower.contains("configuration") || msg_lower.contains("invalid value") {
            return Self::Usage;
        }

        Self::Internal
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// A CLI error with a semantic category for exit code mapping.
#[derive(Debug)]
pub struct CliError {
    /// The semantic category of this error.
    pub category: ErrorCategory,
    /// The underlying error with full context.
    pub source: anyhow::Error,
}

impl CliError {
    /// Create a new CLI error with explicit category.
    pub fn new(category: ErrorCategory, source: impl Into<anyhow::Error>) -> Self {
        Self {
            category,
            source: source.into(),
        }
    }

    /// Get the exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.category.exit_code()
    }
}

impl From<dtsdoc_core::Error> for CliError {
    fn from(err: dtsdoc_core::Error) -> Self {
        Self::new(ErrorCategory::from_core(&err), err)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

/// Determine the exit code from an `anyhow::Error`.
///
/// Checks for a [`CliError`], then a core error anywhere in the chain, and
/// finally falls back to the full message chain.
#[must_use]
pub fn exit_code_from_error(err: &anyhow::Error) -> u8 {
    if let Some(cli_err) = err.downcast_ref::<CliError>() {
        return cli_err.exit_code();
    }

    if let Some(core_err) = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<dtsdoc_core::Error>())
    {
        return ErrorCategory::from_core(core_err).exit_code();
    }

    ErrorCategory::infer_from_message(&format!("{err:#}")).exit_code()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use anyhow::{Context, anyhow};
    use dtsdoc_core::{Error, ExtractError};

    #[test]
    fn test_exit_codes() {
        assert_eq!(ErrorCategory::Internal.exit_code(), 1);
        assert_eq!(ErrorCategory::Usage.exit_code(), 2);
        assert_eq!(ErrorCategory::NotFound.exit_code(), 3);
        assert_eq!(ErrorCategory::InvalidQuery.exit_code(), 4);
        assert_eq!(ErrorCategory::Network.exit_code(), 5);
        assert_eq!(ErrorCategory::Timeout.exit_code(), 6);
        assert_eq!(ErrorCategory::Integrity.exit_code(), 7);
    }

    #[test]
    fn test_core_error_categories() {
        let cases = [
            (
                Error::NotFound {
                    identifier: "Ghost".into(),
                    locator: "u".into(),
                },
                ErrorCategory::NotFound,
            ),
            (
                Error::MethodNotFound {
                    identifier: "Marker".into(),
                    method: "x".into(),
                },
                ErrorCategory::NotFound,
            ),
            (
                Error::Transport {
                    locator: "u".into(),
                    reason: "HTTP status 503".into(),
                },
                ErrorCategory::Network,
            ),
            (
                Error::Extraction {
                    identifier: "Marker".into(),
                    source: ExtractError::MissingClassTitle,
                },
                ErrorCategory::Integrity,
            ),
            (Error::InvalidIdentifier("x".into()), ErrorCategory::InvalidQuery),
            (Error::Config("x".into()), ErrorCategory::Usage),
            (Error::Storage("x".into()), ErrorCategory::Internal),
        ];
        for (err, expected) in cases {
            assert_eq!(ErrorCategory::from_core(&err), expected, "{err}");
        }
    }

    #[test]
    fn test_exit_code_from_cli_error() {
        let err: anyhow::Error = CliError::new(ErrorCategory::Usage, anyhow!("bad flag")).into();
        assert_eq!(exit_code_from_error(&err), 2);
    }

    #[test]
    fn test_exit_code_from_wrapped_core_error() {
        let result: Result<(), Error> = Err(Error::NotFound {
            identifier: "Ghost".into(),
            locator: "u".into(),
        });
        let err = result.context("query failed").unwrap_err();
        assert_eq!(exit_code_from_error(&err), 3);
    }

    #[test]
    fn test_exit_code_inferred_from_message() {
        assert_eq!(exit_code_from_error(&anyhow!("Connection refused")), 5);
        assert_eq!(exit_code_from_error(&anyhow!("Request timed out")), 6);
        assert_eq!(exit_code_from_error(&anyhow!("something odd")), 1);
    }

    #[test]
    fn test_exit_code_inferred_from_cause() {
        let result: Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "No such file or directory",
        ));
        let err = result.context("Failed to read Marker.html").unwrap_err();
        assert_eq!(exit_code_from_error(&err), 3);
    }

    #[test]
    fn test_cli_error_display_is_source() {
        let err = CliError::new(ErrorCategory::NotFound, anyhow!("Method 'x' not found in Marker"));
        assert_eq!(err.to_string(), "Method 'x' not found in Marker");
    }
}
