//! Normalization of API paths into cache identifiers.
//!
//! An API path such as `acApi.marker.add` names a class (`marker`) inside a
//! namespace (`acApi`), optionally followed by a member (`add`). The cache is
//! keyed per class, so everything after the class segment is dropped from the
//! key and kept only as a hint for method focus.
//!
//! ```rust
//! use dtsdoc_core::identifier::{ApiPath, normalize_identifier};
//!
//! let path = ApiPath::parse("acApi.marker.add", "acApi")?;
//! assert_eq!(path.identifier, "Marker");
//! assert_eq!(path.method_hint.as_deref(), Some("add"));
//!
//! assert_eq!(normalize_identifier("acApi.Marker", "acApi")?, "Marker");
//! # Ok::<(), dtsdoc_core::Error>(())
//! ```

use crate::{Error, Result};

/// Namespace prefix used by the default documentation site.
pub const DEFAULT_NAMESPACE_PREFIX: &str = "acApi";

/// A parsed API path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiPath {
    /// Cache identifier (capitalized class segment).
    pub identifier: String,
    /// Segment following the class, if any.
    pub method_hint: Option<String>,
}

impl ApiPath {
    /// Parse `path`, dropping `prefix` when it is the first segment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIdentifier`] when no class segment remains or
    /// the class segment contains characters unsafe for a file name.
    pub fn parse(path: &str, prefix: &str) -> Result<Self> {
        let mut segments = path.trim().split('.').map(str::trim);

        let mut first = segments.next().unwrap_or_default();
        if !prefix.is_empty() && first == prefix {
            first = segments.next().unwrap_or_default();
        }

        if first.is_empty() {
            return Err(Error::InvalidIdentifier(format!(
                "'{path}' does not name a class"
            )));
        }

        let identifier = capitalize(first);
        if !is_valid_identifier(&identifier) {
            return Err(Error::InvalidIdentifier(format!(
                "'{first}' contains characters that are not allowed in a class name"
            )));
        }

        let method_hint = segments
            .next()
            .filter(|segment| !segment.is_empty())
            .map(str::to_string);

        Ok(Self {
            identifier,
            method_hint,
        })
    }
}

/// Normalize an API path into its cache identifier.
///
/// # Errors
///
/// See [`ApiPath::parse`].
pub fn normalize_identifier(path: &str, prefix: &str) -> Result<String> {
    ApiPath::parse(path, prefix).map(|p| p.identifier)
}

/// Upper-case the first character and lower-case the rest.
fn capitalize(segment: &str) -> String {
    let mut chars = segment.chars();
    chars.next().map_or_else(String::new, |first| {
        first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect()
    })
}

/// Whether `identifier` is usable as a cache key and file stem.
#[must_use]
pub fn is_valid_identifier(identifier: &str) -> bool {
    !identifier.is_empty()
        && identifier
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '-'))
}
