//! Extraction output types.
//!
//! A [`Field`] is one candidate value with the evidence trail explaining
//! where it came from. Instances of the same field across artifacts are
//! bucketed in [`FieldInstances`], and a document's result is an
//! [`ExtractionRecord`].

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The bibliographic fields extracted from landing pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldName {
    Title,
    Abstract,
    Author,
    PdfLink,
}

impl FieldName {
    pub const ALL: [Self; 4] = [Self::Title, Self::Abstract, Self::Author, Self::PdfLink];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Abstract => "abstract",
            Self::Author => "author",
            Self::PdfLink => "pdf-link",
        }
    }

    /// Fields whose instances are a list (one per author) rather than
    /// competing guesses at a single value.
    #[must_use]
    pub const fn is_multi_valued(self) -> bool {
        matches!(self, Self::Author)
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == name)
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One candidate value for a named field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default)]
    pub evidence: Vec<String>,
}

impl Field {
    #[must_use]
    pub fn new(name: FieldName, value: impl Into<String>, evidence: Vec<String>) -> Self {
        Self {
            name: name.as_str().to_string(),
            value: Some(value.into()),
            evidence,
        }
    }

    /// Value as a string slice, empty when absent.
    #[must_use]
    pub fn value_str(&self) -> &str {
        self.value.as_deref().unwrap_or_default()
    }

    /// Weighted evidence facts carried by `score:+N` tokens.
    #[must_use]
    pub fn evidence_facts(&self) -> Vec<ExtractionRecord> {
        self.evidence
            .iter()
            .filter_map(|token| {
                let weight = token.strip_prefix("score:")?.trim_start_matches('+').parse::<i32>().ok()?;
                Some(ExtractionRecord::Evidence {
                    evidence: token.clone(),
                    weight,
                })
            })
            .collect()
    }
}

/// All instances found for one field name.
///
/// Invariant: `count == instances.len()` and `exists == (count > 0)` after
/// every mutation, which is why the fields are only mutated through methods.
/// Deserialization recomputes both from `instances`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredInstances")]
pub struct FieldInstances {
    exists: bool,
    count: usize,
    instances: Vec<Field>,
}

impl FieldInstances {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn exists(&self) -> bool {
        self.exists
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.count
    }

    #[must_use]
    pub fn instances(&self) -> &[Field] {
        &self.instances
    }

    /// Best instance (first after ranking).
    #[must_use]
    pub fn best(&self) -> Option<&Field> {
        self.instances.first()
    }

    pub fn push(&mut self, field: Field) {
        self.instances.push(field);
        self.sync();
    }

    pub fn extend(&mut self, fields: impl IntoIterator<Item = Field>) {
        self.instances.extend(fields);
        self.sync();
    }

    /// Drop instances without a non-empty value.
    pub fn retain_nonempty(&mut self) {
        self.instances.retain(|f| !f.value_str().is_empty());
        self.sync();
    }

    /// Stable sort, highest score first.
    pub fn sort_by_score(&mut self, score: impl Fn(&Field) -> f64) {
        let mut scored: Vec<(f64, Field)> = self
            .instances
            .drain(..)
            .map(|f| (score(&f), f))
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        self.instances = scored.into_iter().map(|(_, f)| f).collect();
        self.sync();
    }

    fn sync(&mut self) {
        self.count = self.instances.len();
        self.exists = self.count > 0;
    }
}

/// Persisted shape of [`FieldInstances`]; the stored `exists`/`count` are ignored.
#[derive(Deserialize)]
struct StoredInstances {
    #[serde(default)]
    instances: Vec<Field>,
}

impl From<StoredInstances> for FieldInstances {
    fn from(stored: StoredInstances) -> Self {
        let mut bucket = Self {
            instances: stored.instances,
            ..Self::default()
        };
        bucket.sync();
        bucket
    }
}

/// Field name → instances, in field-name order.
pub type ExtractedFields = BTreeMap<String, FieldInstances>;

/// Result of extracting one document (or an intermediate aggregation).
///
/// Serialized untagged, so a terminal record persists as
/// `{"fields": {...}}` or `{"errors": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExtractionRecord {
    /// Extracted fields (terminal).
    Fields { fields: ExtractedFields },
    /// Nothing could be extracted (terminal).
    Errors { errors: Vec<String> },
    /// Records produced by the rules of one artifact.
    Stanzas { stanzas: Vec<ExtractionRecord> },
    /// Per-artifact records of one document, in artifact order.
    Groups { groups: Vec<ExtractionRecord> },
    /// A single weighted evidence fact.
    Evidence { evidence: String, weight: i32 },
}

impl ExtractionRecord {
    /// Record holding a list of fields, bucketed by name in order.
    #[must_use]
    pub fn from_fields(fields: impl IntoIterator<Item = Field>) -> Self {
        let mut bucketed = ExtractedFields::new();
        for field in fields {
            bucketed.entry(field.name.clone()).or_default().push(field);
        }
        Self::Fields { fields: bucketed }
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Fields { .. } | Self::Errors { .. })
    }

    /// Short kind name for logs and exit reporting.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Fields { .. } => "fields",
            Self::Errors { .. } => "errors",
            Self::Stanzas { .. } => "stanzas",
            Self::Groups { .. } => "groups",
            Self::Evidence { .. } => "evidence",
        }
    }

    /// Collapse aggregation shapes into a terminal record.
    ///
    /// Field instances are appended in record order. If any non-empty field
    /// bucket results, the outcome is `Fields`; otherwise `Errors` with every
    /// error collected along the way. Evidence facts carry no fields and are
    /// dropped.
    #[must_use]
    pub fn resolve(self) -> Self {
        let mut fields = ExtractedFields::new();
        let mut errors = Vec::new();
        self.collect_into(&mut fields, &mut errors);

        fields.retain(|_, bucket| bucket.exists());
        if fields.is_empty() {
            if errors.is_empty() {
                errors.push("no fields extracted".to_string());
            }
            Self::Errors { errors }
        } else {
            Self::Fields { fields }
        }
    }

    fn collect_into(self, fields: &mut ExtractedFields, errors: &mut Vec<String>) {
        match self {
            Self::Fields { fields: found } => {
                for (name, bucket) in found {
                    fields.entry(name).or_default().extend(bucket.instances);
                }
            }
            Self::Errors { errors: found } => errors.extend(found),
            Self::Stanzas { stanzas: records } | Self::Groups { groups: records } => {
                for record in records {
                    record.collect_into(fields, errors);
                }
            }
            Self::Evidence { .. } => {}
        }
    }

    /// Fields of a `Fields` record.
    #[must_use]
    pub fn fields(&self) -> Option<&ExtractedFields> {
        match self {
            Self::Fields { fields } => Some(fields),
            _ => None,
        }
    }

    /// Instances of one field of a `Fields` record.
    #[must_use]
    pub fn field(&self, name: FieldName) -> Option<&FieldInstances> {
        self.fields().and_then(|f| f.get(name.as_str()))
    }
}

/// Flattened single-best view written as `canonical-fields.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "abstract", skip_serializing_if = "Option::is_none")]
    pub abstract_text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<String>,
    #[serde(rename = "pdf-link", skip_serializing_if = "Option::is_none")]
    pub pdf_link: Option<String>,
}

impl CanonicalFields {
    /// Best instance of each single-valued field, all distinct authors.
    #[must_use]
    pub fn from_fields(fields: &ExtractedFields) -> Self {
        let best = |name: FieldName| {
            fields
                .get(name.as_str())
                .and_then(FieldInstances::best)
                .and_then(|f| f.value.clone())
        };

        let mut authors: Vec<String> = Vec::new();
        if let Some(bucket) = fields.get(FieldName::Author.as_str()) {
            for value in bucket.instances().iter().filter_map(|f| f.value.as_ref()) {
                if !authors.contains(value) {
                    authors.push(value.clone());
                }
            }
        }

        Self {
            title: best(FieldName::Title),
            abstract_text: best(FieldName::Abstract),
            authors,
            pdf_link: best(FieldName::PdfLink),
        }
    }
}
