//! Content cache for normalized forms.
//!
//! Maps `(artifact, stage)` of one entry to the text that stage produced,
//! stored as `cache/{artifact}.{stage}` inside the entry directory so the
//! cache survives restarts. A missing file is a miss, never an error. Cached
//! forms are immutable once written; [`ContentCache::invalidate`] deleting
//! the files is the only way to drop them.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::encoding;
use crate::entry;
use crate::error::{Error, Result};
use crate::normalize::NormalForm;

/// Directory (relative to the entry) holding cached forms.
pub const CACHE_DIR: &str = "cache";

/// File-backed cache of one entry's normalized forms.
#[derive(Debug)]
pub struct ContentCache {
    entry_dir: PathBuf,
    enabled: bool,
    computed: AtomicUsize,
}

impl ContentCache {
    /// Cache rooted at an entry directory.
    #[must_use]
    pub fn new(entry_dir: impl Into<PathBuf>) -> Self {
        Self {
            entry_dir: entry_dir.into(),
            enabled: true,
            computed: AtomicUsize::new(0),
        }
    }

    /// A cache that never reads or writes files; every stage is recomputed.
    #[must_use]
    pub fn disabled(entry_dir: impl Into<PathBuf>) -> Self {
        Self {
            enabled: false,
            ..Self::new(entry_dir)
        }
    }

    /// Entry directory this cache belongs to.
    #[must_use]
    pub fn entry_dir(&self) -> &Path {
        &self.entry_dir
    }

    fn path_for(&self, artifact: &str, stage: NormalForm) -> PathBuf {
        self.entry_dir
            .join(CACHE_DIR)
            .join(format!("{artifact}.{}", stage.as_str()))
    }

    /// Cached content for `(artifact, stage)`, `None` on a miss.
    pub fn get(&self, artifact: &str, stage: NormalForm) -> Result<Option<String>> {
        if !self.enabled {
            return Ok(None);
        }
        let path = self.path_for(artifact, stage);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::io(path, e)),
        }
    }

    /// Store content for `(artifact, stage)`.
    pub fn put(&self, artifact: &str, stage: NormalForm, content: &str) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        if stage == NormalForm::Original {
            return Err(Error::Cache(format!(
                "refusing to cache the original form of {artifact}"
            )));
        }
        entry::write_file(&self.path_for(artifact, stage), content.as_bytes())
    }

    /// Content of `stage` for an artifact, computing and writing through
    /// every missing stage from its predecessor.
    ///
    /// `Original` is always read from the artifact file and decoded with the
    /// recorded content type.
    pub fn load_stage(
        &self,
        artifact: &str,
        stage: NormalForm,
        content_type: Option<&str>,
    ) -> Result<String> {
        let Some(prior) = stage.predecessor() else {
            let bytes = entry::read_artifact(&self.entry_dir, artifact)?;
            return Ok(encoding::decode_body(&bytes, content_type));
        };

        if let Some(hit) = self.get(artifact, stage)? {
            tracing::trace!(artifact, stage = %stage, "cache hit");
            return Ok(hit);
        }

        let input = self.load_stage(artifact, prior, content_type)?;
        self.compute_and_store(artifact, stage, &input)
    }

    /// Content of `stage` for an artifact whose predecessor form the caller
    /// already holds; only computed on a cache miss.
    pub fn derive_stage(&self, artifact: &str, stage: NormalForm, input: &str) -> Result<String> {
        if let Some(hit) = self.get(artifact, stage)? {
            tracing::trace!(artifact, stage = %stage, "cache hit");
            return Ok(hit);
        }
        self.compute_and_store(artifact, stage, input)
    }

    fn compute_and_store(&self, artifact: &str, stage: NormalForm, input: &str) -> Result<String> {
        let output = stage.compute(input);
        self.computed.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(artifact, stage = %stage, bytes = output.len(), "computed normal form");
        self.put(artifact, stage, &output)?;
        Ok(output)
    }

    /// Number of stage computations (tidy-norm, css-norm) this cache performed.
    #[must_use]
    pub fn normalization_count(&self) -> usize {
        self.computed.load(Ordering::Relaxed)
    }

    /// Delete every cached form of an artifact.
    pub fn invalidate(&self, artifact: &str) -> Result<()> {
        for stage in NormalForm::ALL {
            let path = self.path_for(artifact, stage);
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(Error::io(path, e)),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry_with_body(body: &str) -> tempfile::TempDir {
        let Ok(tmp) = tempfile::tempdir() else {
            panic!("tempdir");
        };
        let _ = fs::write(tmp.path().join(entry::RESPONSE_BODY), body);
        tmp
    }

    #[test]
    fn test_missing_file_is_miss() {
        let tmp = entry_with_body("<p>x</p>");
        let cache = ContentCache::new(tmp.path());
        assert!(matches!(cache.get(entry::RESPONSE_BODY, NormalForm::CssNorm), Ok(None)));
    }

    #[test]
    fn test_load_stage_writes_through() {
        let tmp = entry_with_body("<html><body><p>hello</p></body></html>");
        let cache = ContentCache::new(tmp.path());

        let Ok(css) = cache.load_stage(entry::RESPONSE_BODY, NormalForm::CssNorm, None) else {
            panic!("css-norm should compute");
        };
        assert!(css.contains("| hello"));
        assert_eq!(cache.normalization_count(), 2);
        assert!(tmp.path().join("cache/response-body.tidy-norm").exists());
        assert!(tmp.path().join("cache/response-body.css-norm").exists());

        // Same instance, second load is served from disk.
        let again = cache.load_stage(entry::RESPONSE_BODY, NormalForm::CssNorm, None);
        assert_eq!(again.ok(), Some(css));
        assert_eq!(cache.normalization_count(), 2);
    }

    #[test]
    fn test_fresh_instance_reuses_files() {
        let tmp = entry_with_body("<p>hello</p>");
        let first = ContentCache::new(tmp.path());
        let _ = first.load_stage(entry::RESPONSE_BODY, NormalForm::CssNorm, None);
        assert!(first.normalization_count() > 0);

        let second = ContentCache::new(tmp.path());
        let _ = second.load_stage(entry::RESPONSE_BODY, NormalForm::CssNorm, None);
        assert_eq!(second.normalization_count(), 0);
    }

    #[test]
    fn test_invalidate_forces_recompute() {
        let tmp = entry_with_body("<p>hello</p>");
        let cache = ContentCache::new(tmp.path());
        let _ = cache.load_stage(entry::RESPONSE_BODY, NormalForm::CssNorm, None);
        assert!(cache.invalidate(entry::RESPONSE_BODY).is_ok());
        assert!(!tmp.path().join("cache/response-body.css-norm").exists());

        let fresh = ContentCache::new(tmp.path());
        let _ = fresh.load_stage(entry::RESPONSE_BODY, NormalForm::CssNorm, None);
        assert_eq!(fresh.normalization_count(), 2);
    }

    #[test]
    fn test_disabled_cache_writes_nothing() {
        let tmp = entry_with_body("<p>hello</p>");
        let cache = ContentCache::disabled(tmp.path());
        let _ = cache.load_stage(entry::RESPONSE_BODY, NormalForm::CssNorm, None);
        let _ = cache.load_stage(entry::RESPONSE_BODY, NormalForm::CssNorm, None);
        assert_eq!(cache.normalization_count(), 4);
        assert!(!tmp.path().join(CACHE_DIR).exists());
    }

    #[test]
    fn test_derive_stage_uses_given_input() {
        let tmp = entry_with_body("<p>ignored</p>");
        let cache = ContentCache::disabled(tmp.path());
        let Ok(css) = cache.derive_stage(entry::RESPONSE_BODY, NormalForm::CssNorm, "<p>given</p>") else {
            panic!("derive_stage");
        };
        assert!(css.contains("| given"));
        assert_eq!(cache.normalization_count(), 1);
    }

    #[test]
    fn test_missing_artifact_is_error() {
        let tmp = entry_with_body("");
        let cache = ContentCache::new(tmp.path());
        let result = cache.load_stage("response-frame-3", NormalForm::TidyNorm, None);
        assert!(matches!(result, Err(Error::Io { .. })));
    }
}
