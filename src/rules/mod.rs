//! Per-site rule registry.
//!
//! Rules are arrows from a normalized [`Page`] to field instances, grouped
//! into three tiers tried in order for every field:
//!
//! 1. generic rules (citation/Dublin Core meta tags, cheap and broadly valid),
//! 2. site rules, each guarded by a URL regex through [`url_filter`],
//! 3. fallback rules (line patterns and selectors, most specific first).
//!
//! Every chain's output passes through the field cleaner, and a chain whose
//! values are all rejected fails. The first chain left with a value wins, so
//! declaration order is part of the behavior. Fields are independent: each gets its own
//! [`attempt_series`] and the results are gathered with [`gather_all`].
//!
//! New publisher coverage is added with [`RuleRegistry::register`]:
//!
//! ```rust
//! use biblio_extract::matchers::{field, score, select_text};
//! use biblio_extract::record::FieldName;
//! use biblio_extract::rules::{RuleRegistry, SiteRule};
//!
//! let mut registry = RuleRegistry::standard();
//! let site = SiteRule::for_pattern("example-press", r"^https?://press\.example\.org/")
//!     .unwrap()
//!     .with(FieldName::Abstract, select_text("div.summary").then(score(2)).then(field(FieldName::Abstract)));
//! registry.register(site);
//! assert_eq!(registry.sites()[0].name, "example-press");
//! ```

pub mod fallback;
pub mod generic;
pub mod sites;

use regex::Regex;

use crate::cleaning;
use crate::control::{attempt_series, gather_all, Arrow, Control, Env, Outcome};
use crate::error::{Error, Result};
use crate::matchers::Page;
use crate::record::{Field, FieldName};

/// One attempt-chain producing instances of a single field.
#[derive(Clone)]
pub struct FieldChain {
    pub field: FieldName,
    pub arrow: Arrow<Page, Vec<Field>>,
}

impl FieldChain {
    #[must_use]
    pub fn new(field: FieldName, arrow: Arrow<Page, Vec<Field>>) -> Self {
        Self { field, arrow }
    }
}

impl std::fmt::Debug for FieldChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldChain").field("field", &self.field).finish_non_exhaustive()
    }
}

/// Rules that only apply to documents whose URL matches `url`.
#[derive(Debug, Clone)]
pub struct SiteRule {
    pub name: String,
    pub url: Regex,
    pub chains: Vec<FieldChain>,
}

impl SiteRule {
    #[must_use]
    pub fn new(name: impl Into<String>, url: Regex) -> Self {
        Self {
            name: name.into(),
            url,
            chains: Vec::new(),
        }
    }

    /// Site rule for a URL regex given as a string.
    pub fn for_pattern(name: impl Into<String>, url_pattern: &str) -> Result<Self> {
        let name = name.into();
        let url = Regex::new(url_pattern)
            .map_err(|e| Error::Config(format!("site rule {name}: invalid url pattern: {e}")))?;
        Ok(Self::new(name, url))
    }

    /// Append a chain for `field`.
    #[must_use]
    pub fn with(mut self, field: FieldName, arrow: Arrow<Page, Vec<Field>>) -> Self {
        self.chains.push(FieldChain::new(field, arrow));
        self
    }

    /// This rule's chains for `field`, each behind the URL guard.
    fn guarded_chains(&self, field: FieldName) -> impl Iterator<Item = Arrow<Page, Vec<Field>>> + '_ {
        self.chains
            .iter()
            .filter(move |c| c.field == field)
            .map(move |c| url_filter(self.url.clone()).then(c.arrow.clone()))
    }
}

/// Pass the page through iff its URL matches `re`; records `url:match:{re}`.
#[must_use]
pub fn url_filter(re: Regex) -> Arrow<Page, Page> {
    Arrow::new(move |page: Page, mut env: Env| {
        if re.is_match(&page.url) {
            env.push_evidence(format!("url:match:{re}"));
            Outcome::Success(page, env)
        } else {
            Outcome::Failure(Control::Continue(None), env)
        }
    })
}

/// The ordered rule tiers.
#[derive(Debug, Clone, Default)]
pub struct RuleRegistry {
    generic: Vec<FieldChain>,
    sites: Vec<SiteRule>,
    fallback: Vec<FieldChain>,
}

impl RuleRegistry {
    /// An empty registry (extracts nothing).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in rule set.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            generic: generic::chains(),
            sites: sites::site_rules(),
            fallback: fallback::chains(),
        }
    }

    /// Add a site rule ahead of the existing ones.
    pub fn register(&mut self, site: SiteRule) {
        tracing::debug!(site = %site.name, url = %site.url, "registering site rule");
        self.sites.insert(0, site);
    }

    /// Append a generic chain (tried before every site rule).
    pub fn add_generic(&mut self, chain: FieldChain) {
        self.generic.push(chain);
    }

    /// Append a fallback chain (tried after every site rule).
    pub fn add_fallback(&mut self, chain: FieldChain) {
        self.fallback.push(chain);
    }

    #[must_use]
    pub fn sites(&self) -> &[SiteRule] {
        &self.sites
    }

    /// Every chain for `field`, in evaluation order.
    #[must_use]
    pub fn chains_for(&self, field: FieldName) -> Vec<Arrow<Page, Vec<Field>>> {
        let tier = |chains: &[FieldChain]| -> Vec<Arrow<Page, Vec<Field>>> {
            chains
                .iter()
                .filter(|c| c.field == field)
                .map(|c| c.arrow.clone())
                .collect()
        };

        let mut ordered = tier(&self.generic);
        for site in &self.sites {
            ordered.extend(site.guarded_chains(field));
        }
        ordered.extend(tier(&self.fallback));
        ordered
    }

    /// First-success arrow for one field, cleaning inside each chain.
    #[must_use]
    pub fn field_arrow(&self, field: FieldName) -> Arrow<Page, Vec<Field>> {
        attempt_series(
            self.chains_for(field)
                .into_iter()
                .map(|chain| chain.then(cleaning::clean_fields()))
                .collect(),
        )
    }

    /// Arrow extracting every field from a page.
    #[must_use]
    pub fn arrow(&self) -> Arrow<Page, Vec<Field>> {
        gather_all(FieldName::ALL.into_iter().map(|f| self.field_arrow(f)).collect())
    }
}
