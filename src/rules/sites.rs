//! Publisher-specific rules.
//!
//! Each entry is guarded by a URL regex. Site rules carry `score:+2` so a
//! value taken from a publisher's own abstract container outranks
//! lookalikes found by the fallbacks on other artifacts.

use super::SiteRule;
use crate::control::Arrow;
use crate::matchers::{
    field, line_match, resolve_link, score, select_attr, select_text, LineMatchOptions, Page,
};
use crate::record::{Field, FieldName};

const SITE_SCORE: u32 = 2;

fn text_of(name: FieldName, query: &str) -> Arrow<Page, Vec<Field>> {
    select_text(query).then(score(SITE_SCORE)).then(field(name))
}

fn attr_of(name: FieldName, query: &str, attr: &str) -> Arrow<Page, Vec<Field>> {
    select_attr(query, attr).then(score(SITE_SCORE)).then(field(name))
}

fn pdf_href(query: &str) -> Arrow<Page, Vec<Field>> {
    select_attr(query, "href")
        .then(resolve_link())
        .then(score(SITE_SCORE))
        .then(field(FieldName::PdfLink))
}

fn lines_after(name: FieldName, patterns: &[&str], opts: LineMatchOptions) -> Arrow<Page, Vec<Field>> {
    line_match(patterns, opts).then(score(SITE_SCORE)).then(field(name))
}

fn site(name: &str, url_pattern: &str, chains: Vec<(FieldName, Arrow<Page, Vec<Field>>)>) -> Option<SiteRule> {
    match SiteRule::for_pattern(name, url_pattern) {
        Ok(rule) => Some(
            chains
                .into_iter()
                .fold(rule, |rule, (field, arrow)| rule.with(field, arrow)),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "skipping site rule");
            None
        }
    }
}

/// Built-in site rules, most specific host first.
#[must_use]
pub fn site_rules() -> Vec<SiteRule> {
    use FieldName::{Abstract, PdfLink, Title};

    [
        site(
            "iospress",
            r"^https?://content\.iospress\.com/",
            vec![(Abstract, attr_of(Abstract, "h1[data-abstract]", "data-abstract"))],
        ),
        site(
            "arxiv",
            r"^https?://(?:www\.|export\.)?arxiv\.org/abs/",
            vec![
                (Title, text_of(Title, "h1.title")),
                (Abstract, text_of(Abstract, "blockquote.abstract")),
                (PdfLink, pdf_href("a.download-pdf")),
            ],
        ),
        site(
            "acl-anthology",
            r"^https?://(?:www\.)?aclanthology\.org/",
            vec![
                (Abstract, text_of(Abstract, "div.acl-abstract span")),
                (Abstract, text_of(Abstract, "div.acl-abstract")),
            ],
        ),
        site(
            "acm-dl",
            r"^https?://dl\.acm\.org/doi/",
            vec![
                (Abstract, text_of(Abstract, "div.abstractSection")),
                (Abstract, text_of(Abstract, "section#abstract")),
                (PdfLink, pdf_href("a[href*='/doi/pdf/']")),
            ],
        ),
        site(
            "ieee-xplore",
            r"^https?://ieeexplore\.ieee\.org/",
            vec![
                (Abstract, text_of(Abstract, "div.abstract-text")),
                (Abstract, attr_of(Abstract, "meta[property='twitter:description']", "content")),
            ],
        ),
        site(
            "springer",
            r"^https?://link\.springer\.com/",
            vec![
                (Abstract, text_of(Abstract, "#Abs1-content")),
                (Abstract, text_of(Abstract, "section.Abstract")),
                (PdfLink, pdf_href("a.c-pdf-download__link")),
            ],
        ),
        site(
            "sciencedirect",
            r"^https?://(?:www\.)?sciencedirect\.com/",
            vec![(Abstract, text_of(Abstract, "div.abstract.author"))],
        ),
        site(
            "neurips",
            r"^https?://(?:papers|proceedings)\.(?:nips|neurips)\.cc/",
            vec![
                (
                    Abstract,
                    lines_after(
                        Abstract,
                        &["h4(?: |$)", "| Abstract"],
                        LineMatchOptions::offset(0).until(&["h4(?: |$)"]),
                    ),
                ),
                (PdfLink, pdf_href("a[href$='Paper.pdf']")),
            ],
        ),
        site(
            "pmlr",
            r"^https?://proceedings\.mlr\.press/",
            vec![
                (Abstract, text_of(Abstract, "div#abstract")),
                (PdfLink, pdf_href("a[href$='.pdf']")),
            ],
        ),
        site(
            "cvf-open-access",
            r"^https?://openaccess\.thecvf\.com/",
            vec![
                (Title, text_of(Title, "div#papertitle")),
                (Abstract, text_of(Abstract, "div#abstract")),
            ],
        ),
        site(
            "openreview",
            r"^https?://openreview\.net/forum",
            vec![
                (
                    Abstract,
                    lines_after(
                        Abstract,
                        &["strong .note-content-field", "| Abstract:"],
                        LineMatchOptions::offset(0).count(8),
                    ),
                ),
                (PdfLink, pdf_href("a.note_content_pdf")),
            ],
        ),
        site(
            "aaai",
            r"^https?://(?:ojs\.)?aaai\.org/",
            vec![(Abstract, text_of(Abstract, "section.item.abstract"))],
        ),
        site(
            "ijcai",
            r"^https?://(?:www\.)?ijcai\.org/proceedings/",
            vec![(
                Abstract,
                text_of(Abstract, "div.container-fluid div.row div.col-md-12"),
            )],
        ),
        site(
            "jmlr",
            r"^https?://(?:www\.)?jmlr\.org/papers/",
            vec![(Abstract, text_of(Abstract, "p.abstract"))],
        ),
        site(
            "wiley",
            r"^https?://(?:\w+\.)?onlinelibrary\.wiley\.com/",
            vec![(
                Abstract,
                text_of(Abstract, "section.article-section__abstract div.article-section__content"),
            )],
        ),
        site(
            "taylor-francis",
            r"^https?://(?:www\.)?tandfonline\.com/",
            vec![(Abstract, text_of(Abstract, "div.abstractSection"))],
        ),
        site(
            "mdpi",
            r"^https?://(?:www\.)?mdpi\.com/",
            vec![(Abstract, text_of(Abstract, "div.art-abstract"))],
        ),
    ]
    .into_iter()
    .flatten()
    .collect()
}
