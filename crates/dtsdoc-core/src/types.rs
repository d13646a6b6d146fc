//! Core record types shared by the extractor, renderer and cache store.
//!
//! Records serialize with `camelCase` field names. Entries written by the
//! earlier cache format used snake_case names (`class_name`, `source_url`,
//! `crawled_at`, `cache_version`); those are accepted as aliases on read so
//! old entries can be backfilled instead of refetched.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder used when a parameter row has no type cell.
pub const UNKNOWN_TYPE: &str = "unknown";

/// Pre-rendered text keyed by view name (`full`, `method:<name>`).
pub type RenderedViews = BTreeMap<String, String>;

/// Structured documentation for one class or namespace page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    /// Class name taken from the page title, with the kind label removed.
    #[serde(alias = "class_name")]
    pub identifier: String,
    /// Class-level description; empty when the page has none.
    #[serde(default)]
    pub description: String,
    /// Documented methods in document order, constructors excluded.
    #[serde(default)]
    pub methods: Vec<MethodRecord>,
    /// Where the markup came from; empty until the caller sets it.
    #[serde(default, alias = "source_url")]
    pub source_locator: String,
}

impl DocumentRecord {
    /// Create an empty record for `identifier`.
    #[must_use]
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            description: String::new(),
            methods: Vec::new(),
            source_locator: String::new(),
        }
    }

    /// First method named `name`, if any.
    #[must_use]
    pub fn find_method(&self, name: &str) -> Option<&MethodRecord> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// Set the source locator using builder pattern.
    #[must_use]
    pub fn with_source_locator(mut self, locator: impl Into<String>) -> Self {
        self.source_locator = locator.into();
        self
    }
}

/// One documented method of a class page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodRecord {
    /// Method name from the anchor id.
    pub name: String,
    /// `name` followed by the signature fragment, e.g. `add(x, y)`.
    #[serde(default)]
    pub signature: String,
    /// Method description; may be empty.
    #[serde(default)]
    pub description: String,
    /// Parameters in table order.
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    /// Return value description, absent when the page has no "Returns:" section.
    #[serde(default)]
    pub returns: Option<String>,
    /// Example code blocks, verbatim.
    #[serde(default)]
    pub examples: Vec<String>,
}

impl MethodRecord {
    /// Create a method record with an empty body.
    #[must_use]
    pub fn new(name: impl Into<String>, signature_fragment: &str) -> Self {
        let name = name.into();
        let signature = format!("{name}{signature_fragment}");
        Self {
            name,
            signature,
            description: String::new(),
            parameters: Vec::new(),
            returns: None,
            examples: Vec::new(),
        }
    }
}

/// A row of a method's parameters table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name.
    pub name: String,
    /// Declared type, or [`UNKNOWN_TYPE`].
    #[serde(rename = "type", default = "unknown_type")]
    pub param_type: String,
    /// Parameter description; may be empty.
    #[serde(default)]
    pub description: String,
}

fn unknown_type() -> String {
    UNKNOWN_TYPE.to_string()
}

/// A [`DocumentRecord`] as persisted by the cache store.
///
/// The record fields are flattened into the same JSON object as the cache
/// metadata, so one entry file is one flat document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedDocument {
    /// Extraction result; never modified by schema migration.
    #[serde(flatten)]
    pub record: DocumentRecord,
    /// When the markup was fetched and extracted.
    #[serde(alias = "crawled_at", with = "timestamp")]
    pub fetched_at: DateTime<Utc>,
    /// Schema version that wrote this entry; absent for the oldest format.
    #[serde(default, alias = "cache_version", skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<String>,
    /// Pre-rendered views; absent for entries written before rendering was cached.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rendered_views: Option<RenderedViews>,
}

impl CachedDocument {
    /// Look up a pre-rendered view by key.
    #[must_use]
    pub fn view(&self, key: &str) -> Option<&str> {
        self.rendered_views
            .as_ref()
            .and_then(|views| views.get(key))
            .map(String::as_str)
    }
}

/// ISO-8601 timestamps that tolerate the offset-less form older entries used.
pub mod timestamp {
    use chrono::{DateTime, Local, NaiveDateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serialize as RFC 3339 in UTC, keeping full sub-second precision.
    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }

    /// Deserialize RFC 3339, or a naive ISO-8601 timestamp in local time.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{raw}'")))
    }

    /// Parse a timestamp string in either accepted form.
    ///
    /// Offset-less timestamps were written in the machine's local time. A
    /// local time that falls in a DST gap is read as UTC.
    #[must_use]
    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| raw.parse::<NaiveDateTime>().ok().map(from_local))
    }

    /// Interpret a naive timestamp as local time.
    #[must_use]
    pub fn from_local(naive: NaiveDateTime) -> DateTime<Utc> {
        naive
            .and_local_timezone(Local)
            .earliest()
            .map_or_else(|| naive.and_utc(), |dt| dt.with_timezone(&Utc))
    }
}
