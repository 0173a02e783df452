//! Error types for biblio-extract.
//!
//! These errors cover storage and programming failures only. A matcher that
//! finds nothing, or a document that cannot be processed (wrong content
//! type, non-200 status), is reported through [`crate::control::Control`]
//! instead and never becomes an `Error`.

use std::path::PathBuf;

/// Error type for extraction operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Reading or writing a file under an entry directory failed.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A persisted JSON file (metadata, cached record) could not be parsed or written.
    #[error("malformed JSON at {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The entry directory does not have the expected layout.
    #[error("invalid entry: {0}")]
    InvalidEntry(String),

    /// The content cache is in an inconsistent state.
    #[error("cache error: {0}")]
    Cache(String),

    /// Options could not be loaded.
    #[error("config error: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, Error>;
