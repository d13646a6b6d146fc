//! # dtsdoc-core
//!
//! Core functionality for dtsdoc, a local cache of JSDoc-generated API
//! reference pages.
//!
//! A query names a class by API path (`acApi.marker.add`). The class page is
//! fetched once, reduced to a structured [`DocumentRecord`], and cached on
//! disk for a week together with pre-rendered markdown views. Later queries,
//! including ones for other methods of the same class, are served from the
//! cache.
//!
//! ## Architecture
//!
//! - **Markup**: tolerant HTML tokenizer with element extents ([`markup`])
//! - **Extraction**: class title, description and methods from a page ([`extract`])
//! - **Rendering**: markdown views of a record ([`render`])
//! - **Cache**: TTL-bound, schema-versioned entry store with backfill ([`cache`])
//! - **Retrieval**: blocking HTTP with bounded retries ([`fetcher`]) and
//!   charset detection ([`charset`])
//! - **Query**: the pipeline joining the above ([`query`])
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::TimeDelta;
//! use dtsdoc_core::{CacheStore, Lookup, extract::extract};
//!
//! let html = r#"<h1 class="page-title">Class: Marker</h1>
//!               <h4 class="name" id="add"><span class="signature">(x, y)</span></h4>"#;
//! let record = extract(html)?;
//!
//! let dir = tempfile::tempdir()?;
//! let store = CacheStore::open(dir.path(), TimeDelta::days(7))?;
//! store.store("Marker", record.clone())?;
//!
//! match store.lookup("Marker", true)? {
//!     Lookup::Hit(doc) => assert_eq!(doc.record, record),
//!     Lookup::Miss(reason) => panic!("unexpected miss: {reason}"),
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

/// Local entry store with expiry and schema backfill
pub mod cache;
/// Page body decoding
pub mod charset;
/// Configuration loading and defaults
pub mod config;
/// Error types and result aliases
pub mod error;
/// Structural extraction from documentation pages
pub mod extract;
/// Page retrieval
pub mod fetcher;
/// API path normalization
pub mod identifier;
/// HTML tokenizing and element queries
pub mod markup;
/// Query pipeline
pub mod query;
/// Markdown rendering
pub mod render;
/// Record types
pub mod types;

pub use cache::{CURRENT_SCHEMA_VERSION, CacheStore, Invalidate, Lookup, MissReason};
pub use config::Config;
pub use error::{Error, Result};
pub use extract::{ExtractError, extract, extract_links};
pub use fetcher::{FetchResponse, HttpRetriever, Retriever, RetryPolicy};
pub use identifier::{ApiPath, normalize_identifier};
pub use query::{DocsClient, QueryOutcome, QueryRequest};
pub use render::{MarkdownRenderer, Renderer, Style};
pub use types::{CachedDocument, DocumentRecord, MethodRecord, Parameter, RenderedViews};
