//! CSS-tree normal form.
//!
//! Flattens a parsed document into indented lines, one per element, with
//! text and comments on their own lines:
//!
//! ```text
//! html
//!   head
//!     meta @citation_title content='Automatic move pruning'
//!   body
//!     div #abstract .section .main
//!       h2
//!         | Abstract
//!       p
//!         | We study move pruning.
//!     comment
//!       ## generated 2016-03-01
//! ```
//!
//! The form is lossy (closing tags, whitespace-only text and the doctype are
//! dropped) and exists so that rules can match structural line sequences
//! with regexes. Indentation is two spaces per tree level; matchers compare
//! indentation rather than relying on the absolute width.

use crate::dom::{self, Document, NodeRef};

/// Spaces per tree level.
pub const INDENT_WIDTH: usize = 2;

/// Prefix of a text line (after indentation).
pub const TEXT_PREFIX: &str = "| ";

/// Prefix of a comment-body line (after indentation).
pub const COMMENT_PREFIX: &str = "## ";

/// Elements whose text content is never emitted.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Serialize HTML source into normal-form lines.
#[must_use]
pub fn serialize_html(html: &str) -> Vec<String> {
    serialize(&dom::parse(html))
}

/// Serialize a parsed document into normal-form lines.
///
/// Depth-first, document order. The traversal uses an explicit stack so
/// pathologically deep documents cannot overflow the call stack.
#[must_use]
pub fn serialize(doc: &Document) -> Vec<String> {
    let mut lines = Vec::new();
    let mut stack: Vec<(NodeRef, usize, bool)> = doc
        .root()
        .children()
        .into_iter()
        .rev()
        .map(|node| (node, 0, false))
        .collect();

    while let Some((node, depth, raw_text)) = stack.pop() {
        if node.is_element() {
            let tag = dom::node_tag(&node).unwrap_or_default();
            lines.push(element_line(&tag, &dom::node_attributes(&node), depth));

            let skip_text = RAW_TEXT_ELEMENTS.contains(&tag.as_str());
            stack.extend(
                node.children()
                    .into_iter()
                    .rev()
                    .map(|child| (child, depth + 1, skip_text)),
            );
        } else if node.is_text() {
            if !raw_text {
                push_prefixed(&mut lines, &dom::node_text(&node), TEXT_PREFIX, depth);
            }
        } else if let Some(comment) = dom::comment_text(&node) {
            lines.push(format!("{}comment", indent(depth)));
            push_prefixed(&mut lines, &comment, COMMENT_PREFIX, depth + 1);
        }
    }

    lines
}

fn indent(depth: usize) -> String {
    " ".repeat(depth * INDENT_WIDTH)
}

fn push_prefixed(lines: &mut Vec<String>, text: &str, prefix: &str, depth: usize) {
    let pad = indent(depth);
    lines.extend(
        text.lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(|l| format!("{pad}{prefix}{l}")),
    );
}

/// Build the line for one element: `{indent}{tag} {attrs}`.
///
/// Attribute tokens come in a fixed order: `#id`, `.class` (one token per
/// class), `@name`, `href='…'`, `src='…'`, then every other attribute as
/// `key='value'` in document order with `content` always last, so a meta
/// line ends with its `content='…'` value.
fn element_line(tag: &str, attrs: &[(String, String)], depth: usize) -> String {
    let lookup = |key: &str| {
        attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| squash(v))
    };

    let mut tokens: Vec<String> = Vec::new();
    if let Some(id) = lookup("id").filter(|v| !v.is_empty()) {
        tokens.push(format!("#{id}"));
    }
    if let Some(class) = lookup("class") {
        tokens.extend(class.split_whitespace().map(|c| format!(".{c}")));
    }
    if let Some(name) = lookup("name").filter(|v| !v.is_empty()) {
        tokens.push(format!("@{name}"));
    }
    for key in ["href", "src"] {
        if let Some(value) = lookup(key) {
            tokens.push(format!("{key}='{value}'"));
        }
    }
    tokens.extend(
        attrs
            .iter()
            .filter(|(k, _)| !matches!(k.as_str(), "id" | "class" | "name" | "href" | "src" | "content"))
            .map(|(k, v)| format!("{k}='{}'", squash(v))),
    );
    if let Some(content) = lookup("content") {
        tokens.push(format!("content='{content}'"));
    }

    let mut line = format!("{}{tag}", indent(depth));
    if !tokens.is_empty() {
        line.push(' ');
        line.push_str(&tokens.join(" "));
    }
    line
}

/// Collapse whitespace inside attribute values so every node stays on one line.
fn squash(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Number of leading spaces of a normal-form line.
#[must_use]
pub fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

/// Text carried by a text line, `None` for element and comment lines.
#[must_use]
pub fn text_of(line: &str) -> Option<&str> {
    line.trim_start_matches(' ').strip_prefix(TEXT_PREFIX)
}
