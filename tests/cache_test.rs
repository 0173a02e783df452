//! Content cache behavior across orchestrator runs.

#![allow(clippy::expect_used)] // expect() is appropriate in tests for clear panic messages

use std::collections::BTreeMap;
use std::path::PathBuf;

use biblio_extract::cache::{ContentCache, CACHE_DIR};
use biblio_extract::entry::{write_fetched, FetchedDocument, RESPONSE_BODY};
use biblio_extract::normalize::NormalForm;
use biblio_extract::{Extractor, FieldName, Options};

const HTML: &str = r#"<html><head>
    <meta name="citation_title" content="Automatic move pruning for single-agent search">
</head><body><h1>Automatic move pruning</h1></body></html>"#;

fn write_entry(frames: usize) -> (tempfile::TempDir, PathBuf) {
    let root = tempfile::tempdir().expect("tempdir");
    let doc = FetchedDocument {
        request_url: "https://example.org/paper".to_string(),
        response_url: "https://example.org/paper".to_string(),
        status: 200,
        headers: BTreeMap::from([("content-type".to_string(), "text/html".to_string())]),
        body: HTML.as_bytes().to_vec(),
        frames: vec![HTML.as_bytes().to_vec(); frames],
        ..FetchedDocument::default()
    };
    let dir = write_fetched(root.path(), &doc).expect("write entry");
    (root, dir)
}

#[test]
fn test_second_run_reuses_cached_forms() {
    let (_root, dir) = write_entry(0);

    let first = Extractor::new(Options::default()).run(&dir).expect("first run");
    assert_eq!(first.normalizations, 2, "tidy-norm and css-norm computed once each");

    let second = Extractor::new(Options::default()).run(&dir).expect("second run");
    assert_eq!(second.normalizations, 0);
    assert_eq!(first.record, second.record);
}

#[test]
fn test_cache_files_written_per_artifact() {
    let (_root, dir) = write_entry(1);
    let report = Extractor::new(Options::default()).run(&dir).expect("run");
    assert_eq!(report.normalizations, 4);

    let cache_dir = dir.join(CACHE_DIR);
    for name in [
        "response-body.tidy-norm",
        "response-body.css-norm",
        "response-frame-0.tidy-norm",
        "response-frame-0.css-norm",
    ] {
        assert!(cache_dir.join(name).is_file(), "missing {name}");
    }
    assert!(!cache_dir.join("response-body.original").exists());
}

#[test]
fn test_invalidate_forces_recompute() {
    let (_root, dir) = write_entry(0);
    let _ = Extractor::new(Options::default()).run(&dir).expect("first run");

    ContentCache::new(&dir).invalidate(RESPONSE_BODY).expect("invalidate");

    let report = Extractor::new(Options::default()).run(&dir).expect("rerun");
    assert_eq!(report.normalizations, 2);
}

#[test]
fn test_cache_disabled() {
    let (_root, dir) = write_entry(0);
    let options = Options {
        use_cache: false,
        ..Options::default()
    };

    for _ in 0..2 {
        let report = Extractor::new(options.clone()).run(&dir).expect("run");
        assert_eq!(report.normalizations, 2);
        assert!(report.record.field(FieldName::Title).is_some());
    }
    assert!(!dir.join(CACHE_DIR).exists());
}

#[test]
fn test_cached_form_is_what_rules_see() {
    let (_root, dir) = write_entry(0);
    let _ = Extractor::new(Options::default()).run(&dir).expect("first run");

    // A hand-edited cached form wins over the body it was derived from.
    let cache = ContentCache::new(&dir);
    let css = cache
        .get(RESPONSE_BODY, NormalForm::CssNorm)
        .expect("cache read")
        .expect("css-norm cached");
    let edited = css.replace("Automatic move pruning for single-agent search", "Edited title");
    cache.put(RESPONSE_BODY, NormalForm::CssNorm, &edited).expect("cache write");

    let report = Extractor::new(Options::default()).run(&dir).expect("rerun");
    let title = report
        .record
        .field(FieldName::Title)
        .and_then(|t| t.best())
        .map(|f| f.value_str().to_string());
    assert_eq!(title.as_deref(), Some("Edited title"));
}
