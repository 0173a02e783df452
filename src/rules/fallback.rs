//! Fallback rules, tried after every site rule.
//!
//! The abstract fallbacks are line patterns over the css-norm form, ordered
//! from the most specific (an element whose id names the abstract) to the
//! most generic (a bare "Abstract" text line). A heading-style rule ends its
//! block at the next heading so it does not swallow the rest of the page.

use super::FieldChain;
use crate::control::Arrow;
use crate::matchers::{
    field, fields, line_match, meta, meta_all, require_pdf, resolve_link, select_attr, select_text,
    LineMatchOptions, Page,
};
use crate::record::{Field, FieldName};

/// Element patterns that end a heading-delimited block.
const NEXT_HEADING: &[&str] = &["h[1-6](?: |$)"];

/// Upper bound on the lines of a labelled block.
const LABELLED_BLOCK_LINES: usize = 60;

/// Container elements whose id or class names the abstract; the block is
/// the container's content.
const CONTAINER_PATTERNS: &[&str] = &[
    r"section #abstract\b",
    r"div #abstract\b",
    r"div #abstracts\b",
    r"div #Abs1-content\b",
    r"div .*\.abstract-content\b",
    r"div .*\.abstractSection\b",
    r"div .*\.article-abstract\b",
    r"div .*\.abstract-text\b",
    r"section .*\.abstract\b",
    r"div .*\.abstract\b",
    r"blockquote .*\.abstract\b",
    r"p .*\.abstract\b",
    r"span .*\.abstract\b",
];

/// Label elements followed by the abstract as their next sibling(s).
const LABEL_ELEMENTS: &[&str] = &[
    "h2(?: |$)",
    "h3(?: |$)",
    "h4(?: |$)",
    "h[1-6](?: |$)",
    "strong(?: |$)",
    "b(?: |$)",
    "dt(?: |$)",
    "td(?: |$)",
    "span(?: |$)",
    "div(?: |$)",
    "p(?: |$)",
];

fn abstract_by_lines(patterns: &[&str], opts: LineMatchOptions) -> FieldChain {
    FieldChain::new(
        FieldName::Abstract,
        line_match(patterns, opts).then(field(FieldName::Abstract)),
    )
}

fn abstract_chains() -> Vec<FieldChain> {
    let mut chains: Vec<FieldChain> = CONTAINER_PATTERNS
        .iter()
        .map(|p| abstract_by_lines(&[p], LineMatchOptions::offset(0)))
        .collect();

    for label in LABEL_ELEMENTS {
        chains.push(abstract_by_lines(
            &[label, r"| (?i)abstract\s*[:.]?$"],
            LineMatchOptions::offset(0)
                .count(LABELLED_BLOCK_LINES)
                .until(NEXT_HEADING),
        ));
    }

    chains.extend([
        // Label and text in the same text node: "Abstract: We study..."
        abstract_by_lines(
            &[r"| (?i)abstract\s*[:.\-–—]\s*\S"],
            LineMatchOptions::offset(-1).count(LABELLED_BLOCK_LINES).until(NEXT_HEADING),
        ),
        // HTML comment marking the abstract.
        abstract_by_lines(
            &["comment", r"## (?i)\s*(?:begin )?abstract\b"],
            LineMatchOptions::offset(0).count(LABELLED_BLOCK_LINES).until(&["comment"]),
        ),
        abstract_by_lines(
            &["h[1-6](?: |$)", r"| (?i)summary\s*:?$"],
            LineMatchOptions::offset(0).count(LABELLED_BLOCK_LINES).until(NEXT_HEADING),
        ),
        abstract_by_lines(
            &[r"| (?i)abstract\s*[:.]?$"],
            LineMatchOptions::offset(0).count(LABELLED_BLOCK_LINES).until(NEXT_HEADING),
        ),
        FieldChain::new(FieldName::Abstract, meta("description").then(field(FieldName::Abstract))),
        FieldChain::new(FieldName::Abstract, meta("og:description").then(field(FieldName::Abstract))),
    ]);
    chains
}

fn text_chain(name: FieldName, query: &str) -> FieldChain {
    FieldChain::new(name, select_text(query).then(field(name)))
}

fn pdf_anchor() -> Arrow<Page, Vec<Field>> {
    select_attr(r#"a[href$=".pdf"], a[href$=".PDF"]"#, "href")
        .then(resolve_link())
        .then(require_pdf())
        .then(field(FieldName::PdfLink))
}

/// Fallback chains in evaluation order.
#[must_use]
pub fn chains() -> Vec<FieldChain> {
    let mut chains = vec![
        FieldChain::new(FieldName::Title, meta("og:title").then(field(FieldName::Title))),
        text_chain(FieldName::Title, "h1"),
        text_chain(FieldName::Title, "title"),
        FieldChain::new(
            FieldName::Author,
            meta_all("author").then(fields(FieldName::Author)),
        ),
        FieldChain::new(FieldName::PdfLink, pdf_anchor()),
    ];
    chains.extend(abstract_chains());
    chains
}
