//! Generic meta-tag rules.
//!
//! Highwire Press `citation_*` tags are emitted by nearly every scholarly
//! publisher and are tried first. Dublin Core tags back them up for the
//! title and authors.

use super::FieldChain;
use crate::matchers::{field, fields, meta, meta_all, resolve_link, score};
use crate::record::FieldName;

fn single(name: FieldName, key: &str) -> FieldChain {
    FieldChain::new(name, meta(key).then(score(1)).then(field(name)))
}

fn multi(name: FieldName, key: &str) -> FieldChain {
    FieldChain::new(name, meta_all(key).then(score(1)).then(fields(name)))
}

/// Generic chains in evaluation order.
#[must_use]
pub fn chains() -> Vec<FieldChain> {
    vec![
        single(FieldName::Title, "citation_title"),
        single(FieldName::Title, "dc.title"),
        multi(FieldName::Author, "citation_author"),
        multi(FieldName::Author, "dc.creator"),
        single(FieldName::Abstract, "citation_abstract"),
        single(FieldName::Abstract, "dc.description"),
        FieldChain::new(
            FieldName::PdfLink,
            meta("citation_pdf_url")
                .then(resolve_link())
                .then(score(1))
                .then(field(FieldName::PdfLink)),
        ),
    ]
}
