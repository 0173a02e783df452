//! Configuration options for field extraction.
//!
//! The `Options` struct controls how entries are normalized, how candidate
//! values are filtered, and how competing field instances are ranked.

use serde::Deserialize;

use crate::error::{Error, Result};

/// Weights used when ranking competing instances of the same field.
///
/// An instance scores `evidence_weight * (sum of "score:+N" evidence markers)
/// + length_weight * (characters in value)`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    /// Points per unit of `score:+N` evidence.
    ///
    /// Default: `100.0`
    pub evidence_weight: f64,

    /// Points per character of extracted text.
    ///
    /// Default: `1.0`
    pub length_weight: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            evidence_weight: 100.0,
            length_weight: 1.0,
        }
    }
}

/// Configuration options for extraction.
///
/// All fields are public for easy configuration. Use `Default::default()`
/// for standard settings, or [`Options::from_json`] to load a partial
/// configuration where missing keys fall back to the defaults.
///
/// # Example
///
/// ```rust
/// use biblio_extract::Options;
///
/// let options = Options {
///     min_abstract_len: 120,
///     write_outputs: false,
///     ..Options::default()
/// };
/// assert!(options.use_cache);
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Abstracts shorter than this (in characters, after cleaning) are discarded.
    ///
    /// Default: `200`
    pub min_abstract_len: usize,

    /// Read and write normalized forms through the on-disk content cache.
    ///
    /// When disabled every stage is recomputed and nothing is written under `cache/`.
    ///
    /// Default: `true`
    pub use_cache: bool,

    /// Write `extracted-fields/*.json` after extraction.
    ///
    /// Default: `true`
    pub write_outputs: bool,

    /// Content-type prefixes accepted by the leading pipeline.
    ///
    /// A `Content-Type` header not starting with one of these halts the artifact.
    ///
    /// Default: `text/html`, `application/xhtml+xml`, `application/xml`, `text/xml`
    pub accepted_content_types: Vec<String>,

    /// Maximum number of `response-frame-{n}` artifacts processed per entry.
    ///
    /// Default: `16`
    pub max_frames: usize,

    /// Ranking weights for competing field instances.
    pub scoring: ScoringWeights,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            min_abstract_len: 200,
            use_cache: true,
            write_outputs: true,
            accepted_content_types: vec![
                "text/html".to_string(),
                "application/xhtml+xml".to_string(),
                "application/xml".to_string(),
                "text/xml".to_string(),
            ],
            max_frames: 16,
            scoring: ScoringWeights::default(),
        }
    }
}

impl Options {
    /// Load options from a JSON document. Missing keys take their default values.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))
    }

    /// Whether a `Content-Type` header value is acceptable for extraction.
    #[must_use]
    pub fn accepts_content_type(&self, content_type: &str) -> bool {
        let content_type = content_type.trim().to_ascii_lowercase();
        self.accepted_content_types
            .iter()
            .any(|accepted| content_type.starts_with(accepted.as_str()))
    }
}
