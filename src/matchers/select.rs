//! Selector matcher.
//!
//! Runs a CSS selector against the DOM of the tidied HTML and takes the
//! first matching element. Zero matches and invalid selectors are both
//! "not found". The arrow forms query the page's shared DOM, so a page is
//! parsed at most once however many selector rules run on it.

use super::Page;
use crate::control::{Arrow, Control, Env, Outcome};
use crate::dom::{self, Document};

fn first_attr(doc: &Document, query: &str, attr: &str) -> Option<String> {
    let first = dom::select_first(doc, query)?;
    dom::get_attribute(&first, attr)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn first_text(doc: &Document, query: &str) -> Option<String> {
    let first = dom::select_first(doc, query)?;
    Some(dom::squashed_text(&first)).filter(|t| !t.is_empty())
}

/// Attribute `attr` of the first element matching `query`.
#[must_use]
pub fn select_elem_attr(html: &str, query: &str, attr: &str) -> Option<String> {
    first_attr(&dom::parse(html), query, attr)
}

/// Whitespace-normalized text of the first element matching `query`.
#[must_use]
pub fn select_elem_text(html: &str, query: &str) -> Option<String> {
    first_text(&dom::parse(html), query)
}

/// Arrow form of [`select_elem_attr`]; records `select:[query]@attr`.
#[must_use]
pub fn select_attr(query: &str, attr: &str) -> Arrow<Page, String> {
    let (query, attr) = (query.to_string(), attr.to_string());
    Arrow::new(move |page: Page, mut env: Env| {
        let token = format!("select:[{query}]@{attr}");
        match first_attr(page.dom(), &query, &attr) {
            Some(value) => {
                env.push_evidence(token);
                Outcome::Success(value, env)
            }
            None => Outcome::Failure(Control::cont(format!("no match for {token}")), env),
        }
    })
}

/// Arrow form of [`select_elem_text`]; records `select:[query]`.
#[must_use]
pub fn select_text(query: &str) -> Arrow<Page, String> {
    let query = query.to_string();
    Arrow::new(move |page: Page, mut env: Env| {
        let token = format!("select:[{query}]");
        match first_text(page.dom(), &query) {
            Some(text) => {
                env.push_evidence(token);
                Outcome::Success(text, env)
            }
            None => Outcome::Failure(Control::cont(format!("no match for {token}")), env),
        }
    })
}
