//! DOM Operations Adapter
//!
//! Thin helpers over the `dom_query` crate used by the tidy stage, the
//! css-norm serializer and the selector matchers. Keeping them here gives
//! the rest of the crate one place that knows about `dom_query` node types.

pub use dom_query::{Document, NodeData, NodeRef, Selection};

pub use tendril::StrTendril;

// === Parsing ===

/// Parse HTML string into document
#[inline]
#[must_use]
pub fn parse(html: &str) -> Document {
    Document::from(html)
}

// === Attribute Operations ===

/// Get any attribute value of the first node in a selection
#[inline]
#[must_use]
pub fn get_attribute(sel: &Selection, name: &str) -> Option<String> {
    sel.attr(name).map(|s| s.to_string())
}

/// Get all attributes of an element node as key-value pairs, in document order
#[must_use]
pub fn node_attributes(node: &NodeRef) -> Vec<(String, String)> {
    node.attrs()
        .iter()
        .map(|attr| (attr.name.local.to_string(), attr.value.to_string()))
        .collect()
}

// === Node Information ===

/// Lower-cased tag name of an element node
#[must_use]
pub fn node_tag(node: &NodeRef) -> Option<String> {
    node.node_name().map(|t| t.to_ascii_lowercase())
}

/// Text content of a text node (or all descendant text of any other node)
///
/// Returns `StrTendril` for zero-copy passing.
#[inline]
#[must_use]
pub fn node_text(node: &NodeRef) -> StrTendril {
    node.text()
}

/// Contents of a comment node, `None` for any other node kind
#[must_use]
pub fn comment_text(node: &NodeRef) -> Option<String> {
    node.query(|tree| match &tree.data {
        NodeData::Comment { contents } => Some(contents.to_string()),
        _ => None,
    })
    .flatten()
}

// === Querying ===

/// First element matching a CSS selector.
///
/// Returns `None` for an invalid selector as well as for zero matches, so
/// callers never see a panic from a malformed rule.
#[must_use]
pub fn select_first<'a>(doc: &'a Document, selector: &str) -> Option<Selection<'a>> {
    doc.try_select(selector)
        .filter(|sel| !sel.is_empty())
        .and_then(|sel| sel.nodes().first().map(|node| Selection::from(*node)))
}

/// Normalized text of a selection: all descendant text with runs of
/// whitespace collapsed to single spaces
#[must_use]
pub fn squashed_text(sel: &Selection) -> String {
    sel.text().split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_first_takes_document_order() {
        let doc = parse(r#"<div><p class="a">one</p><p class="a">two</p></div>"#);
        let first = select_first(&doc, "p.a");
        assert_eq!(first.map(|s| s.text().to_string()), Some("one".to_string()));
    }

    #[test]
    fn test_select_first_invalid_selector() {
        let doc = parse("<p>text</p>");
        assert!(select_first(&doc, "p[[[").is_none());
        assert!(select_first(&doc, "article").is_none());
    }

    #[test]
    fn test_squashed_text() {
        let doc = parse("<div>  Hello\n   <b>big</b>\n world </div>");
        let div = doc.select("div");
        assert_eq!(squashed_text(&div), "Hello big world");
    }

    #[test]
    fn test_node_attributes_in_order() {
        let doc = parse(r#"<a href="/x" id="l" data-k="v">x</a>"#);
        let a = doc.select("a");
        let Some(node) = a.nodes().first() else {
            panic!("expected anchor node");
        };
        let attrs = node_attributes(node);
        assert_eq!(
            attrs,
            vec![
                ("href".to_string(), "/x".to_string()),
                ("id".to_string(), "l".to_string()),
                ("data-k".to_string(), "v".to_string()),
            ]
        );
        assert_eq!(get_attribute(&a, "data-k"), Some("v".to_string()));
    }
}
