//! Pattern matchers.
//!
//! Matchers are pure functions over a normalized [`Page`]: css-norm lines
//! for the line-sequence and meta-tag matchers, tidied HTML for the selector
//! matcher. Each has a plain function form and an [`Arrow`] form that
//! records evidence and turns "nothing found" into `Continue`.

pub mod lines;
pub mod meta;
pub mod select;

use std::cell::OnceCell;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use crate::control::{for_each_do, Arrow, Control, Env, Outcome};
use crate::dom::{self, Document};
use crate::record::{Field, FieldName};
use crate::url_utils;

pub use lines::{find_by_line_match, line_match, LineMatchOptions};
pub use meta::{find_all_in_meta, find_in_meta, meta, meta_all};
pub use select::{select_attr, select_elem_attr, select_elem_text, select_text};

/// A normalized artifact as seen by the rules.
///
/// Clones share the lines, the HTML and the DOM parsed from it, which is
/// built on the first selector query and reused by every later one.
#[derive(Clone)]
pub struct Page {
    /// Final URL of the document.
    pub url: String,
    /// CSS-tree normal form lines.
    pub lines: Arc<Vec<String>>,
    /// Tidied HTML, the input of selector queries.
    pub html: Arc<String>,
    dom: Rc<OnceCell<Document>>,
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("url", &self.url)
            .field("lines", &self.lines.len())
            .field("html", &self.html.len())
            .field("parsed", &self.dom.get().is_some())
            .finish()
    }
}

impl Page {
    #[must_use]
    pub fn new(url: impl Into<String>, lines: Vec<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            lines: Arc::new(lines),
            html: Arc::new(html.into()),
            dom: Rc::new(OnceCell::new()),
        }
    }

    /// DOM of the tidied HTML, parsed once per page.
    #[must_use]
    pub fn dom(&self) -> &Document {
        self.dom.get_or_init(|| dom::parse(&self.html))
    }

    /// Page built directly from HTML, tidying and serializing it in place.
    #[must_use]
    pub fn from_html(url: impl Into<String>, html: &str) -> Self {
        let tidy = crate::normalize::tidy::tidy_html(html);
        let lines = crate::normalize::css_norm::serialize_html(&tidy);
        Self::new(url, lines, tidy)
    }
}

/// Wrap a found value into a single-element field list, snapshotting the
/// environment's evidence.
#[must_use]
pub fn field(name: FieldName) -> Arrow<String, Vec<Field>> {
    Arrow::new(move |value: String, env: Env| {
        let found = Field::new(name, value, env.evidence().to_vec());
        Outcome::Success(vec![found], env)
    })
}

/// Turn every found value into its own field instance.
#[must_use]
pub fn fields(name: FieldName) -> Arrow<Vec<String>, Vec<Field>> {
    let one = Arrow::new(move |value: String, env: Env| {
        let found = Field::new(name, value, env.evidence().to_vec());
        Outcome::Success(found, env)
    });
    for_each_do(one).then(Arrow::new(|found: Vec<Field>, env| {
        if found.is_empty() {
            Outcome::Failure(Control::cont("no values"), env)
        } else {
            Outcome::Success(found, env)
        }
    }))
}

/// Resolve a link against the document URL; unresolvable links continue.
#[must_use]
pub fn resolve_link() -> Arrow<String, String> {
    Arrow::new(|href: String, env: Env| match url_utils::resolve_link(&href, env.response_url()) {
        Some(resolved) => Outcome::Success(resolved, env),
        None => Outcome::Failure(Control::cont(format!("unresolvable link {href}")), env),
    })
}

/// Keep only values that look like PDF links.
#[must_use]
pub fn require_pdf() -> Arrow<String, String> {
    Arrow::new(|href: String, env: Env| {
        if url_utils::is_pdf_link(&href) {
            Outcome::Success(href, env)
        } else {
            Outcome::Failure(Control::cont("not a pdf link"), env)
        }
    })
}

/// Attach a `score:+N` marker to the evidence trail.
#[must_use]
pub fn score<A: 'static>(points: u32) -> Arrow<A, A> {
    crate::control::with_evidence(format!("score:+{points}"))
}
