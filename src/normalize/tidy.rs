//! The `tidy-norm` stage.
//!
//! Parsing with an HTML5 parser and serializing the resulting tree repairs
//! unclosed tags, lower-cases element names, and quotes attributes, so that
//! later stages see one canonical spelling of the markup.

use crate::dom;

/// Parse and re-serialize an HTML document.
#[must_use]
pub fn tidy_html(html: &str) -> String {
    dom::parse(html).html().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tidy_closes_and_lowercases() {
        let tidy = tidy_html("<HTML><BODY><P CLASS=x>one<p>two</BODY>");
        assert!(tidy.contains(r#"<p class="x">one</p>"#));
        assert!(tidy.contains("<p>two</p>"));
    }

    #[test]
    fn test_tidy_is_stable() {
        let once = tidy_html("<div><span>a</div>");
        assert_eq!(tidy_html(&once), once);
    }
}
