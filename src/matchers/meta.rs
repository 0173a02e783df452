//! Meta-tag matcher.
//!
//! Works on css-norm lines, where a meta element serializes as
//! `meta @citation_title content='...'` or
//! `meta property='og:title' content='...'`. The `content` attribute is
//! always the last token of the line, so its value is the text between
//! `content='` and the final quote.

use regex::Regex;

use super::Page;
use crate::control::{Arrow, Control, Env, Outcome};

/// Matches a meta line whose `@name`, `property`, `http-equiv` or
/// `itemprop` token is `key`. Applied to the line without its `content`.
fn meta_line_regex(key: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(
        r"^meta(?: .*)? (?:@|property='|http-equiv='|itemprop=')(?i:{})(?:'| |$)",
        regex::escape(key)
    ))
}

/// The line up to its trailing `content='...'` token.
fn head_of(line: &str) -> &str {
    line.find(" content='").map_or(line, |at| &line[..at])
}

/// The `content` value of a meta line.
fn content_of(line: &str) -> Option<&str> {
    let start = line.find("content='")? + "content='".len();
    let end = line.rfind('\'')?;
    (end > start)
        .then(|| line[start..end].trim())
        .filter(|v| !v.is_empty())
}

/// Content of `line` when it is a meta line selected by `re`.
fn matching_content<'a>(line: &'a str, re: &Regex) -> Option<&'a str> {
    let line = line.trim_start();
    if re.is_match(head_of(line)) {
        content_of(line)
    } else {
        None
    }
}

/// Content of the first meta line named `key` (as `name`, `property`,
/// `http-equiv` or `itemprop`, case-insensitively).
#[must_use]
pub fn find_in_meta(lines: &[String], key: &str) -> Option<String> {
    let re = meta_line_regex(key).ok()?;
    lines
        .iter()
        .find_map(|l| matching_content(l, &re))
        .map(ToString::to_string)
}

/// Contents of every meta line carrying `key`, in document order.
#[must_use]
pub fn find_all_in_meta(lines: &[String], key: &str) -> Vec<String> {
    let Ok(re) = meta_line_regex(key) else {
        return Vec::new();
    };
    lines
        .iter()
        .filter_map(|l| matching_content(l, &re))
        .map(ToString::to_string)
        .collect()
}

/// Arrow form of [`find_in_meta`]; records `meta:[key]`.
#[must_use]
pub fn meta(key: &str) -> Arrow<Page, String> {
    let key = key.to_string();
    Arrow::new(move |page: Page, mut env: Env| match find_in_meta(&page.lines, &key) {
        Some(content) => {
            env.push_evidence(format!("meta:[{key}]"));
            Outcome::Success(content, env)
        }
        None => Outcome::Failure(Control::cont(format!("no meta {key}")), env),
    })
}

/// Arrow form of [`find_all_in_meta`]; continues when there is no match.
#[must_use]
pub fn meta_all(key: &str) -> Arrow<Page, Vec<String>> {
    let key = key.to_string();
    Arrow::new(move |page: Page, mut env: Env| {
        let found = find_all_in_meta(&page.lines, &key);
        if found.is_empty() {
            Outcome::Failure(Control::cont(format!("no meta {key}")), env)
        } else {
            env.push_evidence(format!("meta:[{key}]"));
            Outcome::Success(found, env)
        }
    })
}
