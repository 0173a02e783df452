//! Ranking of competing field instances.
//!
//! When several artifacts (or several rules) produce a value for the same
//! single-valued field, instances are ordered best-first: explicit
//! `score:+N` evidence counts most, then the length of the extracted text,
//! longer being taken as more complete. Ties keep artifact order.
//!
//! The weights are a policy knob ([`ScoringWeights`]), not a contract.

use crate::options::ScoringWeights;
use crate::record::{ExtractedFields, ExtractionRecord, Field, FieldName};

/// Sum of the `score:+N` evidence markers of an instance.
#[must_use]
pub fn evidence_points(field: &Field) -> i64 {
    field
        .evidence_facts()
        .iter()
        .map(|fact| match fact {
            ExtractionRecord::Evidence { weight, .. } => i64::from(*weight),
            _ => 0,
        })
        .sum()
}

/// Score of one instance under `weights`.
#[must_use]
pub fn score_instance(field: &Field, weights: &ScoringWeights) -> f64 {
    let length = field.value_str().chars().count();
    weights.evidence_weight * evidence_points(field) as f64 + weights.length_weight * length as f64
}

/// Rank every single-valued field bucket best-first.
///
/// Multi-valued fields (authors) are lists, not alternatives, and keep
/// document order.
pub fn rank_fields(fields: &mut ExtractedFields, weights: &ScoringWeights) {
    for (name, bucket) in fields.iter_mut() {
        if FieldName::from_name(name).is_some_and(FieldName::is_multi_valued) {
            continue;
        }
        bucket.sort_by_score(|f| score_instance(f, weights));
    }
}
