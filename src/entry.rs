//! Document entries on disk.
//!
//! Each fetched URL gets an entry directory whose path is derived from a
//! hash of the URL:
//!
//! ```text
//! {root}/{h0h1}/{h2h3}/{sha256-hex}/
//!     metadata.json               responseUrl, status, fetchChain, timestamp, headers
//!     response-body               raw body bytes
//!     response-frame-0 ...        raw sub-frame bodies, discovery order
//!     cache/{artifact}.{stage}    cached normal forms
//!     extracted-fields/extraction-records.json
//!     extracted-fields/canonical-fields.json
//! ```
//!
//! The fetch itself happens elsewhere; this module only persists and reads
//! what a fetcher produced.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// File name of the primary response body.
pub const RESPONSE_BODY: &str = "response-body";

/// File name prefix of sub-frame bodies.
pub const FRAME_PREFIX: &str = "response-frame-";

/// Entry metadata file.
pub const METADATA_FILE: &str = "metadata.json";

/// Directory holding extraction outputs.
pub const EXTRACTED_FIELDS_DIR: &str = "extracted-fields";

/// What the fetch collaborator hands over for one URL.
#[derive(Debug, Clone, Default)]
pub struct FetchedDocument {
    /// URL the request was made for.
    pub request_url: String,
    /// Final URL after redirects.
    pub response_url: String,
    /// HTTP status of the final response.
    pub status: u16,
    /// Redirect chain, request URL first.
    pub fetch_chain: Vec<String>,
    /// Response headers (names lower-cased by the writer).
    pub headers: BTreeMap<String, String>,
    /// Primary response body.
    pub body: Vec<u8>,
    /// Bodies of sub-frames in discovery order.
    pub frames: Vec<Vec<u8>>,
}

/// Contents of `metadata.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryMetadata {
    pub response_url: String,
    pub status: u16,
    #[serde(default)]
    pub fetch_chain: Vec<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl EntryMetadata {
    /// Read `metadata.json` from an entry directory.
    pub fn load(entry_dir: &Path) -> Result<Self> {
        let path = entry_dir.join(METADATA_FILE);
        let raw = fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
        serde_json::from_str(&raw).map_err(|e| Error::json(&path, e))
    }

    /// Metadata of a successful, redirect-free HTML fetch of `url`.
    #[must_use]
    pub fn for_url(url: &str) -> Self {
        Self {
            response_url: url.to_string(),
            status: 200,
            fetch_chain: vec![url.to_string()],
            timestamp: Utc::now(),
            headers: BTreeMap::from([("content-type".to_string(), "text/html".to_string())]),
        }
    }

    /// Recorded `Content-Type` header, if any.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("content-type"))
            .map(|(_, v)| v.as_str())
    }
}

/// Entry directory for a URL under `root`.
///
/// ```
/// use std::path::Path;
/// use biblio_extract::entry::entry_path_for_url;
///
/// let a = entry_path_for_url(Path::new("/corpus"), "https://arxiv.org/abs/1");
/// let b = entry_path_for_url(Path::new("/corpus"), "https://arxiv.org/abs/1");
/// assert_eq!(a, b);
/// assert!(a.starts_with("/corpus"));
/// ```
#[must_use]
pub fn entry_path_for_url(root: &Path, url: &str) -> PathBuf {
    let digest = format!("{:x}", Sha256::digest(url.as_bytes()));
    root.join(&digest[0..2]).join(&digest[2..4]).join(&digest)
}

/// Persist a fetched document as a new entry and return its directory.
///
/// Existing artifact files for the same URL are overwritten; cached normal
/// forms are left alone, so callers re-fetching a URL should invalidate the
/// cache for it.
pub fn write_fetched(root: &Path, fetched: &FetchedDocument) -> Result<PathBuf> {
    let entry_dir = entry_path_for_url(root, &fetched.request_url);
    fs::create_dir_all(&entry_dir).map_err(|e| Error::io(&entry_dir, e))?;

    write_file(&entry_dir.join(RESPONSE_BODY), &fetched.body)?;
    for (n, frame) in fetched.frames.iter().enumerate() {
        write_file(&entry_dir.join(format!("{FRAME_PREFIX}{n}")), frame)?;
    }

    let metadata = EntryMetadata {
        response_url: fetched.response_url.clone(),
        status: fetched.status,
        fetch_chain: fetched.fetch_chain.clone(),
        timestamp: Utc::now(),
        headers: fetched
            .headers
            .iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v.clone()))
            .collect(),
    };
    let path = entry_dir.join(METADATA_FILE);
    let json = serde_json::to_string_pretty(&metadata).map_err(|e| Error::json(&path, e))?;
    write_file(&path, json.as_bytes())?;

    Ok(entry_dir)
}

/// Artifacts of an entry in processing order: the response body first,
/// then frames by ascending frame number. At most `max_frames` frames.
pub fn list_artifacts(entry_dir: &Path, max_frames: usize) -> Result<Vec<String>> {
    let mut frames: Vec<usize> = Vec::new();
    let mut has_body = false;

    let dir = fs::read_dir(entry_dir).map_err(|e| Error::io(entry_dir, e))?;
    for item in dir {
        let item = item.map_err(|e| Error::io(entry_dir, e))?;
        let name = item.file_name().to_string_lossy().to_string();
        if name == RESPONSE_BODY {
            has_body = true;
        } else if let Some(n) = name
            .strip_prefix(FRAME_PREFIX)
            .and_then(|n| n.parse::<usize>().ok())
        {
            frames.push(n);
        }
    }
    frames.sort_unstable();

    let mut artifacts = Vec::with_capacity(frames.len() + 1);
    if has_body {
        artifacts.push(RESPONSE_BODY.to_string());
    }
    artifacts.extend(
        frames
            .into_iter()
            .take(max_frames)
            .map(|n| format!("{FRAME_PREFIX}{n}")),
    );
    Ok(artifacts)
}

/// Raw bytes of one artifact.
pub fn read_artifact(entry_dir: &Path, artifact: &str) -> Result<Vec<u8>> {
    let path = entry_dir.join(artifact);
    fs::read(&path).map_err(|e| Error::io(&path, e))
}

/// Write `bytes` to `path` through a temporary file in the same directory,
/// renamed into place once complete. Readers never see a partial file.
pub(crate) fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(|e| Error::io(parent, e))?;
    tmp.write_all(bytes).map_err(|e| Error::io(tmp.path(), e))?;
    tmp.as_file().sync_all().map_err(|e| Error::io(tmp.path(), e))?;
    tmp.persist(path).map_err(|e| Error::io(path, e.error))?;
    Ok(())
}
