//! Response-body decoding.
//!
//! Raw artifact files are stored as fetched bytes. Before the `original`
//! normal form can be used they are decoded to UTF-8, using the charset from
//! the recorded `Content-Type` header when present and falling back to
//! in-document `<meta>` declarations.

use encoding_rs::{Encoding, UTF_8};
use regex::Regex;
use std::sync::LazyLock;

/// `charset=` parameter of a Content-Type header value.
#[allow(clippy::expect_used)]
static HEADER_CHARSET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)charset\s*=\s*["']?([^"';\s]+)"#).expect("valid regex")
});

/// `<meta charset="...">`
#[allow(clippy::expect_used)]
static CHARSET_META_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]+charset\s*=\s*["']?([^"'\s>/]+)"#).expect("valid regex")
});

/// `<meta http-equiv="Content-Type" content="...; charset=...">`
#[allow(clippy::expect_used)]
static CONTENT_TYPE_CHARSET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]+http-equiv\s*=\s*["']?content-type["']?[^>]+content\s*=\s*["']?[^"'>]*;\s*charset\s*=\s*([^"'\s>]+)"#).expect("valid regex")
});

/// Pick the encoding of a response body.
///
/// Order of precedence:
/// 1. A byte-order mark
/// 2. The `charset` parameter of the recorded Content-Type header
/// 3. `<meta charset>` / `<meta http-equiv="Content-Type">` in the first 1024 bytes
/// 4. UTF-8
#[must_use]
pub fn detect_encoding(body: &[u8], content_type: Option<&str>) -> &'static Encoding {
    if let Some((encoding, _)) = Encoding::for_bom(body) {
        return encoding;
    }

    if let Some(encoding) = content_type
        .and_then(|ct| first_capture(&HEADER_CHARSET_RE, ct))
        .and_then(|label| Encoding::for_label(label.as_bytes()))
    {
        return encoding;
    }

    let head = String::from_utf8_lossy(&body[..body.len().min(1024)]);
    [&*CHARSET_META_RE, &*CONTENT_TYPE_CHARSET_RE]
        .iter()
        .filter_map(|re| first_capture(re, &head))
        .find_map(|label| Encoding::for_label(label.as_bytes()))
        .unwrap_or(UTF_8)
}

fn first_capture(re: &Regex, haystack: &str) -> Option<String> {
    re.captures(haystack)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Decode a response body to a UTF-8 string.
///
/// Invalid sequences become U+FFFD rather than failing the artifact.
///
/// ```
/// use biblio_extract::encoding::decode_body;
///
/// let body = b"<html><body>Caf\xE9</body></html>";
/// assert!(decode_body(body, Some("text/html; charset=ISO-8859-1")).contains("Café"));
/// ```
#[must_use]
pub fn decode_body(body: &[u8], content_type: Option<&str>) -> String {
    let encoding = detect_encoding(body, content_type);
    let (decoded, _encoding_used, _had_errors) = encoding.decode(body);
    decoded.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_charset_wins_over_meta() {
        let body = br#"<html><head><meta charset="utf-8"></head><body>Test</body></html>"#;
        let encoding = detect_encoding(body, Some("text/html; charset=windows-1252"));
        assert_eq!(encoding.name(), "windows-1252");
    }

    #[test]
    fn meta_charset_used_without_header() {
        let body = br#"<html><head><meta charset="ISO-8859-1"></head><body>Test</body></html>"#;
        // encoding_rs maps ISO-8859-1 to windows-1252 per WHATWG
        assert_eq!(detect_encoding(body, None).name(), "windows-1252");
    }

    #[test]
    fn http_equiv_charset_used_without_header() {
        let body = br#"<meta http-equiv="Content-Type" content="text/html; charset=ISO-8859-1">"#;
        assert_eq!(detect_encoding(body, Some("text/html")).name(), "windows-1252");
    }

    #[test]
    fn bom_wins() {
        let body = b"\xEF\xBB\xBF<html><meta charset=\"windows-1252\"></html>";
        assert_eq!(detect_encoding(body, None), UTF_8);
    }

    #[test]
    fn defaults_to_utf8() {
        assert_eq!(detect_encoding(b"<html><body>Test</body></html>", None), UTF_8);
    }

    #[test]
    fn decode_invalid_utf8_gracefully() {
        let result = decode_body(b"<p>Test \xFF\xFE Invalid</p>", None);
        assert!(result.contains("Test"));
        assert!(result.contains("Invalid"));
    }
}
