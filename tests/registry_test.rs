//! Extending the rule registry and the failure records of unprocessable entries.

#![allow(clippy::expect_used)] // expect() is appropriate in tests for clear panic messages

use std::collections::BTreeMap;
use std::path::PathBuf;

use biblio_extract::entry::{write_fetched, FetchedDocument, EXTRACTED_FIELDS_DIR};
use biblio_extract::matchers::{field, line_match, score, select_text, LineMatchOptions};
use biblio_extract::rules::{FieldChain, RuleRegistry, SiteRule};
use biblio_extract::{ExtractionRecord, Extractor, FieldName, Options, RECORDS_FILE};

const PRESS_HTML: &str = r#"<html><head>
    <meta name="citation_title" content="Learning heuristics">
</head><body>
    <div class="summary-box">We learn admissible heuristics from small problem instances and show that they transfer to larger ones without loss of optimality guarantees, across several benchmark domains including sliding-tile puzzles and pancake sorting problems.</div>
</body></html>"#;

fn write_entry(url: &str, body: &str, status: u16, content_type: &str) -> (tempfile::TempDir, PathBuf) {
    let root = tempfile::tempdir().expect("tempdir");
    let doc = FetchedDocument {
        request_url: url.to_string(),
        response_url: url.to_string(),
        status,
        headers: BTreeMap::from([("Content-Type".to_string(), content_type.to_string())]),
        body: body.as_bytes().to_vec(),
        ..FetchedDocument::default()
    };
    let dir = write_fetched(root.path(), &doc).expect("write entry");
    (root, dir)
}

fn press_rule() -> SiteRule {
    SiteRule::for_pattern("example-press", r"^https?://press\.example\.org/")
        .expect("valid pattern")
        .with(
            FieldName::Abstract,
            select_text("div.summary-box")
                .then(score(2))
                .then(field(FieldName::Abstract)),
        )
}

#[test]
fn test_registered_site_extends_coverage() {
    let (_root, dir) = write_entry("https://press.example.org/article/7", PRESS_HTML, 200, "text/html");

    let standard = Extractor::new(Options::default()).extract(&dir);
    assert!(standard.field(FieldName::Abstract).is_none());

    let mut registry = RuleRegistry::standard();
    registry.register(press_rule());
    let record = Extractor::with_registry(Options::default(), &registry).extract(&dir);

    let best = record
        .field(FieldName::Abstract)
        .and_then(|b| b.best())
        .expect("abstract from the registered rule");
    assert!(best.value_str().starts_with("We learn admissible heuristics"));
    assert!(best.evidence.iter().any(|e| e.starts_with("url:match:")));
    assert!(best.evidence.contains(&"score:+2".to_string()));
}

#[test]
fn test_registered_site_ignores_other_hosts() {
    let (_root, dir) = write_entry("https://other.example.org/article/7", PRESS_HTML, 200, "text/html");
    let mut registry = RuleRegistry::standard();
    registry.register(press_rule());
    let record = Extractor::with_registry(Options::default(), &registry).extract(&dir);
    assert!(record.field(FieldName::Abstract).is_none());
    assert!(record.field(FieldName::Title).is_some());
}

#[test]
fn test_custom_fallback_chain() {
    let html = r#"<html><body>
        <dl><dt>Summary</dt><dd>A summary long enough to be kept as the abstract of this paper, describing in some detail how learned heuristics are trained on small instances, validated on medium ones, and deployed on large instances of classic search benchmarks.</dd></dl>
    </body></html>"#;
    let (_root, dir) = write_entry("https://example.net/p/1", html, 200, "text/html");

    let mut registry = RuleRegistry::new();
    registry.add_fallback(FieldChain::new(
        FieldName::Abstract,
        line_match(&["dt", "| Summary"], LineMatchOptions::offset(0)).then(field(FieldName::Abstract)),
    ));
    let record = Extractor::with_registry(Options::default(), &registry).extract(&dir);
    let values: Vec<&str> = record
        .field(FieldName::Abstract)
        .map(|b| b.instances().iter().map(|f| f.value_str()).collect())
        .unwrap_or_default();
    assert_eq!(values.len(), 1);
    assert!(values[0].starts_with("A summary long enough"));
}

#[test]
fn test_non_200_status_yields_errors() {
    let (_root, dir) = write_entry("https://press.example.org/a", PRESS_HTML, 503, "text/html");
    let record = Extractor::new(Options::default()).extract(&dir);
    let ExtractionRecord::Errors { errors } = &record else {
        panic!("expected errors, got {record:?}");
    };
    assert!(errors.iter().any(|e| e.contains("status 503")));

    let written = std::fs::read_to_string(dir.join(EXTRACTED_FIELDS_DIR).join(RECORDS_FILE))
        .expect("records file written for errors too");
    assert!(written.contains("\"errors\""));
    assert!(!dir.join(EXTRACTED_FIELDS_DIR).join("canonical-fields.json").exists());
}

#[test]
fn test_wrong_content_type_yields_errors() {
    let (_root, dir) = write_entry("https://press.example.org/a", "%PDF-1.4", 200, "application/pdf");
    let record = Extractor::new(Options::default()).extract(&dir);
    let ExtractionRecord::Errors { errors } = &record else {
        panic!("expected errors, got {record:?}");
    };
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("response-body: halt:"));
}

#[test]
fn test_nothing_matched_yields_errors() {
    let (_root, dir) = write_entry("https://example.net/empty", "<html><body></body></html>", 200, "text/html");
    let record = Extractor::new(Options::default()).extract(&dir);
    assert_eq!(record.kind(), "errors");
}
