//! # biblio-extract
//!
//! Bibliographic field extraction from fetched scholarly landing pages.
//!
//! Given an entry directory holding a fetched HTML response (and any
//! sub-frame bodies), this library normalizes each artifact into an
//! indentation-based line form, runs an ordered registry of per-site and
//! generic rules over it, cleans the candidate values, and ranks competing
//! candidates. Every value carries the evidence trail explaining where it
//! came from.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::collections::BTreeMap;
//! use biblio_extract::entry::{write_fetched, FetchedDocument};
//! use biblio_extract::record::FieldName;
//! use biblio_extract::{extract_entry, Options};
//!
//! let html = r#"<html><head>
//!   <meta name="citation_title" content="Automatic move pruning for single-agent search">
//!   <meta name="citation_author" content="Burch, Neil">
//!   <meta name="citation_author" content="Holte, Robert C.">
//! </head><body></body></html>"#;
//!
//! let root = tempfile::tempdir()?;
//! let entry_dir = write_fetched(root.path(), &FetchedDocument {
//!     request_url: "https://example.org/paper".into(),
//!     response_url: "https://example.org/paper".into(),
//!     status: 200,
//!     headers: BTreeMap::from([("content-type".into(), "text/html".into())]),
//!     body: html.as_bytes().to_vec(),
//!     ..FetchedDocument::default()
//! })?;
//!
//! let record = extract_entry(&entry_dir, &Options::default());
//! let title = record.field(FieldName::Title).and_then(|t| t.best());
//! assert_eq!(title.map(|f| f.value_str()), Some("Automatic move pruning for single-agent search"));
//! assert_eq!(record.field(FieldName::Author).map(|a| a.count()), Some(2));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Pipeline
//!
//! - **Normalization**: `original` → `tidy-norm` → `css-norm`, each stage cached on disk
//! - **Rules**: arrows composed with an evidence/control algebra; "not found" is data
//! - **Cleaning**: audited text rules (label stripping, boilerplate truncation)
//! - **Ranking**: `score:+N` evidence first, then text length

mod error;
mod extract;
mod options;

/// DOM adapter over `dom_query`.
pub mod dom;

/// Character encoding detection and transcoding.
pub mod encoding;

/// URL utilities for host extraction and link resolution.
pub mod url_utils;

/// Normal forms: tidy HTML and the css-norm line serialization.
pub mod normalize;

/// Entry directory layout, metadata, and artifact listing.
pub mod entry;

/// File-backed cache of normalized forms.
pub mod cache;

/// Evidence/control algebra and arrow combinators.
pub mod control;

/// Line, meta-tag and selector matchers.
pub mod matchers;

/// Per-site rule registry.
pub mod rules;

/// Field cleaning rules.
pub mod cleaning;

/// Field, instance and record types.
pub mod record;

/// Ranking of competing field instances.
pub mod scoring;

// Public API - re-exports
pub use error::{Error, Result};
pub use extract::{ExtractionReport, Extractor, CANONICAL_FILE, RECORDS_FILE};
pub use options::{Options, ScoringWeights};
pub use record::{ExtractionRecord, Field, FieldInstances, FieldName};

/// Extracts an entry directory with the built-in rules.
///
/// Never fails: unprocessable documents and internal errors alike come back
/// as an [`ExtractionRecord::Errors`] record.
#[must_use]
pub fn extract_entry(entry_dir: &std::path::Path, options: &Options) -> ExtractionRecord {
    Extractor::new(options.clone()).extract(entry_dir)
}

/// Like [`extract_entry`], but storage and programming errors are returned
/// instead of being folded into the record.
#[allow(clippy::missing_errors_doc)]
pub fn try_extract_entry(entry_dir: &std::path::Path, options: &Options) -> Result<ExtractionRecord> {
    Extractor::new(options.clone())
        .run(entry_dir)
        .map(|report| report.record)
}
