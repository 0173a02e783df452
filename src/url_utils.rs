//! URL Utility Functions
//!
//! Host extraction for `url:host:*` evidence and resolution of relative
//! links (pdf links found in landing pages are frequently relative).

use url::Url;

/// Check if a string is a valid absolute http(s) URL.
///
/// # Returns
/// * `(is_absolute, parsed_url)` - Whether URL is absolute and the parsed URL if valid
#[must_use]
pub fn is_absolute_url(s: &str) -> (bool, Option<Url>) {
    let s = s.trim();

    if !s.starts_with("http://") && !s.starts_with("https://") {
        return (false, None);
    }

    match Url::parse(s) {
        Ok(url) if url.host().is_some() => (true, Some(url)),
        _ => (false, None),
    }
}

/// Extract the lower-cased hostname from an absolute URL.
#[must_use]
pub fn extract_hostname(url_str: &str) -> Option<String> {
    let (_, parsed) = is_absolute_url(url_str);
    parsed
        .and_then(|url| url.host_str().map(str::to_ascii_lowercase))
        .filter(|host| !host.is_empty())
}

/// Resolve a link found in a page against the page's response URL.
///
/// Absolute links are returned unchanged. `javascript:`, `mailto:` and
/// fragment-only links resolve to `None`, as does anything that cannot be
/// joined onto `base`.
#[must_use]
pub fn resolve_link(href: &str, base: &str) -> Option<String> {
    let href = href.trim();

    if href.is_empty()
        || href.starts_with('#')
        || href.starts_with("javascript:")
        || href.starts_with("mailto:")
    {
        return None;
    }

    if let (true, Some(url)) = is_absolute_url(href) {
        return Some(url.to_string());
    }

    let (_, base) = is_absolute_url(base);
    base.and_then(|b| b.join(href).ok()).map(|u| u.to_string())
}

/// Whether a link points at a PDF, judged by the path of the URL.
#[must_use]
pub fn is_pdf_link(href: &str) -> bool {
    let path = href.split(['?', '#']).next().unwrap_or(href);
    path.to_ascii_lowercase().ends_with(".pdf")
}
