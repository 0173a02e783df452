//! Extraction orchestrator.
//!
//! For every artifact of an entry (the response body, then frames in
//! ascending order) the orchestrator runs the leading pipeline (content
//! type, HTTP status, load the normalized forms through the cache), then
//! the rule registry, whose chains clean their own values. Per-artifact records are
//! merged in artifact order, competing instances are ranked, and the
//! terminal record is optionally written back into the entry.

use std::path::Path;
use std::sync::Arc;

use crate::control::{Arrow, Control, EntryContext, Env, Outcome};
use crate::entry::{self, EntryMetadata, EXTRACTED_FIELDS_DIR};
use crate::error::{Error, Result};
use crate::matchers::Page;
use crate::normalize::NormalForm;
use crate::options::Options;
use crate::record::{CanonicalFields, ExtractionRecord, Field, FieldName};
use crate::rules::RuleRegistry;
use crate::scoring;
use crate::url_utils;

/// File holding the terminal record.
pub const RECORDS_FILE: &str = "extraction-records.json";

/// File holding the flattened best-instance view.
pub const CANONICAL_FILE: &str = "canonical-fields.json";

/// Outcome of one orchestrator run over an entry.
#[derive(Debug, Clone)]
pub struct ExtractionReport {
    /// Terminal record (`Fields` or `Errors`).
    pub record: ExtractionRecord,
    /// Normal-form stages computed (cache misses) during this run.
    pub normalizations: usize,
}

/// Runs a rule registry over entry directories.
pub struct Extractor {
    options: Options,
    rules: Arrow<Page, Vec<Field>>,
}

impl Extractor {
    /// Extractor with the built-in rules.
    #[must_use]
    pub fn new(options: Options) -> Self {
        Self::with_registry(options, &RuleRegistry::standard())
    }

    #[must_use]
    pub fn with_registry(options: Options, registry: &RuleRegistry) -> Self {
        Self {
            options,
            rules: registry.arrow(),
        }
    }

    #[must_use]
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Extract an entry; failures of any kind end up in an `Errors` record.
    #[must_use]
    pub fn extract(&self, entry_dir: &Path) -> ExtractionRecord {
        match self.run(entry_dir) {
            Ok(report) => report.record,
            Err(e) => {
                tracing::error!(entry = %entry_dir.display(), error = %e, "extraction failed");
                ExtractionRecord::Errors {
                    errors: vec![format!("extraction failed: {e}")],
                }
            }
        }
    }

    /// Extract an entry, propagating storage and programming errors.
    ///
    /// Documents that merely cannot be processed (wrong content type,
    /// non-200 status, unreadable body, no matching rule) still produce
    /// `Ok` with an `Errors` record.
    pub fn run(&self, entry_dir: &Path) -> Result<ExtractionReport> {
        let metadata = match EntryMetadata::load(entry_dir) {
            Ok(metadata) => metadata,
            Err(Error::Io { path, source }) => {
                tracing::warn!(entry = %entry_dir.display(), error = %source, "entry metadata unreadable");
                let record = ExtractionRecord::Errors {
                    errors: vec![format!("halt: unreadable {}: {source}", path.display())],
                };
                return Ok(ExtractionReport {
                    record,
                    normalizations: 0,
                });
            }
            Err(e) => return Err(e),
        };

        let ctx = Arc::new(EntryContext::new(entry_dir, metadata, self.options.clone()));
        let artifacts = entry::list_artifacts(entry_dir, self.options.max_frames)?;
        if artifacts.is_empty() {
            return Err(Error::InvalidEntry(format!(
                "{} has no response artifacts",
                entry_dir.display()
            )));
        }

        let mut groups = Vec::with_capacity(artifacts.len());
        for artifact in &artifacts {
            let env = Env::new(Arc::clone(&ctx), artifact.as_str());
            groups.push(self.extract_artifact(env)?);
        }

        let mut record = ExtractionRecord::Groups { groups }.resolve();
        if let ExtractionRecord::Fields { fields } = &mut record {
            scoring::rank_fields(fields, &self.options.scoring);
        }

        tracing::info!(
            entry = %entry_dir.display(),
            kind = record.kind(),
            artifacts = artifacts.len(),
            normalizations = ctx.cache.normalization_count(),
            "entry extracted"
        );

        if self.options.write_outputs {
            write_outputs(entry_dir, &record)?;
        }

        Ok(ExtractionReport {
            record,
            normalizations: ctx.cache.normalization_count(),
        })
    }

    /// Run the whole pipeline on one artifact.
    fn extract_artifact(&self, env: Env) -> Result<ExtractionRecord> {
        let artifact = env.artifact().to_string();
        let _guard = env.span().clone().entered();

        let page = match admit().apply((), env) {
            Outcome::Success((), env) => load_page(env)?,
            Outcome::Failure(control, env) => Outcome::Failure(control, env),
        };

        match self.rules.run(page) {
            Outcome::Success(found, _) => {
                tracing::debug!(count = found.len(), "fields found");
                Ok(ExtractionRecord::Stanzas {
                    stanzas: FieldName::ALL
                        .into_iter()
                        .map(|name| {
                            ExtractionRecord::from_fields(
                                found.iter().filter(|f| f.name == name.as_str()).cloned(),
                            )
                        })
                        .collect(),
                })
            }
            Outcome::Failure(control, env) => {
                tracing::debug!(%control, failures = env.failures().len(), "artifact produced no fields");
                Ok(artifact_error(&artifact, env.failures(), &control))
            }
        }
    }
}

/// Every failure message of an artifact, then the final control.
fn artifact_error(artifact: &str, failures: &[String], control: &Control) -> ExtractionRecord {
    let errors = failures
        .iter()
        .cloned()
        .chain(std::iter::once(control.to_string()))
        .map(|message| format!("{artifact}: {message}"))
        .collect();
    ExtractionRecord::Errors { errors }
}

/// Content-type and status checks shared by every artifact.
fn admit() -> Arrow<(), ()> {
    Arrow::new(|(), env: Env| {
        if let Some(content_type) = env.metadata().content_type() {
            if !env.options().accepts_content_type(content_type) {
                let reason = format!("content-type {content_type} not accepted");
                return Outcome::Failure(Control::halt(reason), env);
            }
        }
        let status = env.metadata().status;
        if status != 200 {
            return Outcome::Failure(Control::halt(format!("status {status}")), env);
        }
        Outcome::Success((), env)
    })
}

/// Load the tidy-norm and css-norm forms of the current artifact.
///
/// An unreadable artifact halts; any other failure is a storage or
/// programming error and propagates.
fn load_page(mut env: Env) -> Result<Outcome<Page>> {
    let content_type = env.metadata().content_type().map(str::to_string);
    let cache = env.cache();
    let loaded = cache
        .load_stage(env.artifact(), NormalForm::TidyNorm, content_type.as_deref())
        .and_then(|tidy| {
            let css = cache.derive_stage(env.artifact(), NormalForm::CssNorm, &tidy)?;
            Ok((tidy, css))
        });

    let (tidy, css) = match loaded {
        Ok(forms) => forms,
        Err(Error::Io { path, source }) => {
            let reason = format!("unreadable {}: {source}", path.display());
            return Ok(Outcome::Failure(Control::halt(reason), env));
        }
        Err(e) => return Err(e),
    };

    let url = env.response_url().to_string();
    env.set_input(NormalForm::CssNorm);
    env.push_evidence(format!("use-input:{}", NormalForm::CssNorm));
    env.push_evidence(format!("artifact:{}", env.artifact()));
    if let Some(host) = url_utils::extract_hostname(&url) {
        env.push_evidence(format!("url:host:{host}"));
    }

    let lines = css.lines().map(ToString::to_string).collect();
    Ok(Outcome::Success(Page::new(url, lines, tidy), env))
}

fn write_outputs(entry_dir: &Path, record: &ExtractionRecord) -> Result<()> {
    let out_dir = entry_dir.join(EXTRACTED_FIELDS_DIR);

    let path = out_dir.join(RECORDS_FILE);
    let json = serde_json::to_string_pretty(record).map_err(|e| Error::json(&path, e))?;
    entry::write_file(&path, json.as_bytes())?;

    if let Some(fields) = record.fields() {
        let path = out_dir.join(CANONICAL_FILE);
        let canonical = CanonicalFields::from_fields(fields);
        let json = serde_json::to_string_pretty(&canonical).map_err(|e| Error::json(&path, e))?;
        entry::write_file(&path, json.as_bytes())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::entry::{write_fetched, FetchedDocument};

    fn fetched(body: &str, status: u16, content_type: &str) -> FetchedDocument {
        FetchedDocument {
            request_url: "https://example.org/paper/1".to_string(),
            response_url: "https://example.org/paper/1".to_string(),
            status,
            fetch_chain: vec!["https://example.org/paper/1".to_string()],
            headers: BTreeMap::from([("Content-Type".to_string(), content_type.to_string())]),
            body: body.as_bytes().to_vec(),
            frames: vec![],
        }
    }

    fn entry(doc: &FetchedDocument) -> (tempfile::TempDir, std::path::PathBuf) {
        let Ok(tmp) = tempfile::tempdir() else {
            panic!("tempdir");
        };
        let Ok(dir) = write_fetched(tmp.path(), doc) else {
            panic!("write_fetched");
        };
        (tmp, dir)
    }

    const PAGE: &str = r#"<html><head>
        <meta name="citation_title" content="  Automatic   move pruning ">
        </head><body><p>x</p></body></html>"#;

    #[test]
    fn test_title_evidence_trail() {
        let (_tmp, dir) = entry(&fetched(PAGE, 200, "text/html; charset=utf-8"));
        let record = Extractor::new(Options::default()).extract(&dir);
        let Some(title) = record.field(FieldName::Title).and_then(|b| b.best()) else {
            panic!("expected a title, got {record:?}");
        };
        assert_eq!(title.value_str(), "Automatic move pruning");
        assert_eq!(
            title.evidence,
            [
                "use-input:css-norm",
                "artifact:response-body",
                "url:host:example.org",
                "meta:[citation_title]",
                "score:+1",
            ]
        );
    }

    #[test]
    fn test_attribute_text_cleaned_with_evidence() {
        let body = "We study move pruning, a technique that removes redundant operator \
                    sequences from the search space, and show how the redundancy \
                    information can be computed automatically before search begins on standard puzzle benchmarks.";
        let html = format!(
            "<html><body><h1 data-abstract=\"Abstract:\n    {body}\">Automatic move pruning</h1></body></html>"
        );
        let doc = FetchedDocument {
            response_url: "http://content.iospress.com/articles/aic170001".to_string(),
            ..fetched(&html, 200, "text/html")
        };
        let (_tmp, dir) = entry(&doc);
        let record = Extractor::new(Options::default()).extract(&dir);
        let Some(found) = record.field(FieldName::Abstract).and_then(|b| b.best()) else {
            panic!("expected an abstract, got {record:?}");
        };
        assert_eq!(found.value_str(), body);
        assert!(found.evidence.contains(&"url:host:content.iospress.com".to_string()));
        assert!(found.evidence.iter().any(|e| e.starts_with("clean:strip-abstract-label:")));
    }

    #[test]
    fn test_short_meta_abstract_gives_way() {
        let body = "We study move pruning, a technique that removes redundant operator \
                    sequences from the search space, and show how the redundancy \
                    information can be computed automatically before search begins on standard puzzle benchmarks.";
        let html = format!(
            r#"<html><head>
            <meta name="citation_title" content="T">
            <meta name="citation_abstract" content="Too short to keep.">
            </head><body><div id="abstract"><p>{body}</p></div></body></html>"#
        );
        let (_tmp, dir) = entry(&fetched(&html, 200, "text/html"));
        let record = Extractor::new(Options::default()).extract(&dir);
        let Some(found) = record.field(FieldName::Abstract) else {
            panic!("expected an abstract, got {record:?}");
        };
        assert_eq!(found.count(), 1);
        assert_eq!(found.instances()[0].value_str(), body);
    }

    #[test]
    fn test_unmatched_page_lists_reasons() {
        let (_tmp, dir) = entry(&fetched("<p>nothing</p>", 200, "text/html"));
        let record = Extractor::new(Options::default()).extract(&dir);
        let ExtractionRecord::Errors { errors } = record else {
            panic!("expected errors, got {record:?}");
        };
        assert!(errors.contains(&"response-body: continue: no meta citation_title".to_string()));
        assert!(errors.len() > 4);
        assert!(errors.iter().all(|e| e.starts_with("response-body: ")));
    }

    #[test]
    fn test_status_halts() {
        let (_tmp, dir) = entry(&fetched(PAGE, 404, "text/html"));
        let record = Extractor::new(Options::default()).extract(&dir);
        let ExtractionRecord::Errors { errors } = record else {
            panic!("expected errors, got {record:?}");
        };
        assert_eq!(errors, vec!["response-body: halt: status 404"]);
    }

    #[test]
    fn test_content_type_halts() {
        let (_tmp, dir) = entry(&fetched(PAGE, 200, "application/pdf"));
        let record = Extractor::new(Options::default()).extract(&dir);
        let ExtractionRecord::Errors { errors } = record else {
            panic!("expected errors, got {record:?}");
        };
        assert!(errors[0].contains("content-type application/pdf not accepted"));
    }

    #[test]
    fn test_missing_metadata_is_errors() {
        let Ok(tmp) = tempfile::tempdir() else {
            panic!("tempdir");
        };
        let record = Extractor::new(Options::default()).extract(tmp.path());
        assert_eq!(record.kind(), "errors");
    }

    #[test]
    fn test_outputs_written() {
        let (_tmp, dir) = entry(&fetched(PAGE, 200, "text/html"));
        let _ = Extractor::new(Options::default()).extract(&dir);

        let out = dir.join(EXTRACTED_FIELDS_DIR);
        let Ok(raw) = std::fs::read_to_string(out.join(RECORDS_FILE)) else {
            panic!("records file missing");
        };
        let Ok(json) = serde_json::from_str::<serde_json::Value>(&raw) else {
            panic!("records file is not JSON");
        };
        assert_eq!(json["fields"]["title"]["count"], 1);

        let Ok(raw) = std::fs::read_to_string(out.join(CANONICAL_FILE)) else {
            panic!("canonical file missing");
        };
        assert!(raw.contains("Automatic move pruning"));
    }

    #[test]
    fn test_no_outputs_when_disabled() {
        let (_tmp, dir) = entry(&fetched(PAGE, 200, "text/html"));
        let options = Options {
            write_outputs: false,
            ..Options::default()
        };
        let _ = Extractor::new(options).extract(&dir);
        assert!(!dir.join(EXTRACTED_FIELDS_DIR).exists());
    }

    #[test]
    fn test_short_abstract_dropped() {
        let html = r#"<html><head>
            <meta name="citation_title" content="T">
            <meta name="citation_abstract" content="Too short to keep.">
            </head></html>"#;
        let (_tmp, dir) = entry(&fetched(html, 200, "text/html"));
        let record = Extractor::new(Options::default()).extract(&dir);
        assert!(record.field(FieldName::Abstract).is_none());
        assert!(record.field(FieldName::Title).is_some());
    }
}
