//! The query pipeline: identifier → cache → retrieval → extraction → focus.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use url::Url;

use crate::cache::{CacheStore, Lookup};
use crate::extract::extract;
use crate::fetcher::Retriever;
use crate::identifier::ApiPath;
use crate::render::{MarkdownRenderer, Renderer};
use crate::types::{CachedDocument, MethodRecord};
use crate::{Error, Result};

/// One documentation query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryRequest {
    /// API path such as `acApi.marker` or `acApi.marker.add`.
    pub api_path: String,
    /// Method to focus on; falls back to the path's method segment.
    pub method: Option<String>,
    /// Skip the cache lookup and fetch again.
    pub refresh: bool,
}

impl QueryRequest {
    /// Query `api_path` with no method focus.
    #[must_use]
    pub fn new(api_path: impl Into<String>) -> Self {
        Self {
            api_path: api_path.into(),
            ..Self::default()
        }
    }

    /// Focus on `method`.
    #[must_use]
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// Bypass the cache.
    #[must_use]
    pub const fn with_refresh(mut self, refresh: bool) -> Self {
        self.refresh = refresh;
        self
    }
}

/// Result of a successful query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOutcome {
    /// The cached (or freshly stored) document.
    pub document: CachedDocument,
    /// The focused method, when one was requested.
    pub focus: Option<MethodRecord>,
    /// Whether the document came from the cache.
    pub from_cache: bool,
    /// Page locator for the identifier.
    pub locator: String,
}

impl QueryOutcome {
    /// Cache identifier of the document.
    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.document.record.identifier
    }
}

/// Resolve `<identifier>.html` against `base_url`.
///
/// # Errors
///
/// Returns [`Error::InvalidUrl`] if `base_url` is not a usable base.
///
/// ```rust
/// use dtsdoc_core::query::page_locator;
///
/// let url = page_locator("https://sdk.example.com/doc/api/", "Marker")?;
/// assert_eq!(url, "https://sdk.example.com/doc/api/Marker.html");
/// # Ok::<(), dtsdoc_core::Error>(())
/// ```
pub fn page_locator(base_url: &str, identifier: &str) -> Result<String> {
    let base = Url::parse(base_url)
        .map_err(|e| Error::InvalidUrl(format!("'{base_url}': {e}")))?;
    base.join(&format!("{identifier}.html"))
        .map(String::from)
        .map_err(|e| Error::InvalidUrl(format!("cannot resolve {identifier} against '{base_url}': {e}")))
}

/// Documentation client tying the cache store to a retriever.
#[derive(Debug)]
pub struct DocsClient<R, D = MarkdownRenderer> {
    store: CacheStore<D>,
    retriever: R,
    base_url: String,
    namespace_prefix: String,
}

impl<R: Retriever, D: Renderer> DocsClient<R, D> {
    /// Create a client.
    pub fn new(
        store: CacheStore<D>,
        retriever: R,
        base_url: impl Into<String>,
        namespace_prefix: impl Into<String>,
    ) -> Self {
        Self {
            store,
            retriever,
            base_url: base_url.into(),
            namespace_prefix: namespace_prefix.into(),
        }
    }

    /// The underlying cache store.
    pub const fn store(&self) -> &CacheStore<D> {
        &self.store
    }

    /// Run a query.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidIdentifier`] for a path that names no class
    /// - [`Error::NotFound`] when the origin reports 404
    /// - [`Error::Transport`] when retrieval fails and no raw markup is cached
    /// - [`Error::Extraction`] when the page lacks a class title
    /// - [`Error::MethodNotFound`] when the focused method does not exist
    pub fn query(&self, request: &QueryRequest) -> Result<QueryOutcome> {
        let path = ApiPath::parse(&request.api_path, &self.namespace_prefix)?;
        let identifier = path.identifier.as_str();
        let locator = page_locator(&self.base_url, identifier)?;
        let method = request
            .method
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .or(path.method_hint.as_deref());

        debug!("query {} -> {identifier} (method: {method:?})", request.api_path);

        let cached = if request.refresh {
            None
        } else {
            match self.store.lookup(identifier, true)? {
                Lookup::Hit(doc) => Some(doc),
                Lookup::Miss(reason) => {
                    info!("cache miss for {identifier}: {reason}");
                    None
                },
            }
        };

        let (document, from_cache) = match cached {
            Some(doc) => (doc, true),
            None => (self.fetch_and_store(identifier, &locator)?, false),
        };

        let focus = method
            .map(|name| {
                document
                    .record
                    .find_method(name)
                    .cloned()
                    .ok_or_else(|| Error::MethodNotFound {
                        identifier: identifier.to_string(),
                        method: name.to_string(),
                    })
            })
            .transpose()?;

        Ok(QueryOutcome {
            document,
            focus,
            from_cache,
            locator,
        })
    }

    fn fetch_and_store(&self, identifier: &str, locator: &str) -> Result<CachedDocument> {
        let response = self.retriever.fetch(locator);

        if response.is_not_found() {
            return Err(Error::NotFound {
                identifier: identifier.to_string(),
                locator: locator.to_string(),
            });
        }

        let usable = response.is_success();
        let reason = response.failure_reason();
        let (markup, fetched_at) = match response.markup.filter(|_| usable) {
            Some(markup) => {
                if let Err(e) = self.store.save_raw_markup(locator, &markup) {
                    warn!("failed to save raw markup for {locator}: {e}");
                }
                (markup, Utc::now())
            },
            None => match self.store.raw_markup(locator) {
                Some(markup) => {
                    warn!("fetch of {locator} failed ({reason}); using saved raw markup");
                    // Keep the age of the saved copy so expiry still retries the origin.
                    let saved_at = self
                        .store
                        .raw_markup_saved_at(locator)
                        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
                    (markup, saved_at)
                },
                None => {
                    return Err(Error::Transport {
                        locator: locator.to_string(),
                        reason,
                    });
                },
            },
        };

        let record = extract(&markup)
            .map_err(|source| Error::Extraction {
                identifier: identifier.to_string(),
                source,
            })?
            .with_source_locator(locator);

        info!("extracted {} methods for {identifier}", record.methods.len());
        self.store.store_at(identifier, record, fetched_at)
    }
}
