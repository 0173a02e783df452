//! Field cleaning.
//!
//! Candidate values pass through an ordered list of [`CleaningRule`]s, each
//! applied to the output of the previous one. A rule runs only if one of its
//! guards matches the current value (or it has no guards). Every rule that
//! actually changes the value leaves a [`CleaningChange`] describing what it
//! removed and inserted, so a reviewer can see why a value looks the way it
//! does.
//!
//! [`clean_fields`] runs the rules inside each rule chain: a value the rules
//! empty out is not a real instance, so the chain fails and the next
//! alternative for the field gets its turn.

#![allow(clippy::expect_used)]

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::control::{Arrow, Control, Env, Outcome};
use crate::record::{Field, FieldName};

static LEADING_ABSTRACT_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\W*abstract\b[\s:.\-–—]*").expect("LEADING_ABSTRACT_LABEL regex")
});

static TRAILING_BOILERPLATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?s)(?:\bReferences\b|\bREFERENCES\b|\bKeywords\b|\bKEYWORDS\b|\bKey words\b|\bRelated Material\b|Please enable JavaScript to view the comments|comments powered by Disqus).*$",
    )
    .expect("TRAILING_BOILERPLATE regex")
});

static LEADING_NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\w(\[“‘]+").expect("LEADING_NON_WORD regex"));

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("WHITESPACE_RUN regex"));

/// A single text-cleaning step.
#[derive(Debug, Clone)]
pub struct CleaningRule {
    pub name: String,
    /// The rule applies if any guard matches the current value; no guards means always.
    pub guards: Vec<Regex>,
    run: RuleFn,
}

#[derive(Clone)]
enum RuleFn {
    Plain(fn(&str) -> Option<String>),
    MinLength(usize),
}

impl std::fmt::Debug for RuleFn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plain(_) => f.write_str("Plain(..)"),
            Self::MinLength(n) => write!(f, "MinLength({n})"),
        }
    }
}

impl CleaningRule {
    #[must_use]
    pub fn new(name: &str, guards: Vec<Regex>, run: fn(&str) -> Option<String>) -> Self {
        Self {
            name: name.to_string(),
            guards,
            run: RuleFn::Plain(run),
        }
    }

    /// Whether the rule's guards admit `value`.
    #[must_use]
    pub fn applies_to(&self, value: &str) -> bool {
        self.guards.is_empty() || self.guards.iter().any(|g| g.is_match(value))
    }

    /// Run the rule; `None` means "leave the value alone".
    #[must_use]
    pub fn run(&self, value: &str) -> Option<String> {
        match &self.run {
            RuleFn::Plain(f) => f(value),
            RuleFn::MinLength(min) => (value.chars().count() < *min).then(String::new),
        }
    }
}

/// What one rule did to a value: `removed` was replaced by `inserted` at
/// character `offset` of the value the rule received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleaningChange {
    pub rule: String,
    pub offset: usize,
    pub removed: String,
    pub inserted: String,
}

impl CleaningChange {
    /// Character diff reduced to one edit by trimming the common prefix and suffix.
    #[must_use]
    pub fn between(rule: &str, before: &str, after: &str) -> Self {
        let a: Vec<char> = before.chars().collect();
        let b: Vec<char> = after.chars().collect();

        let prefix = a.iter().zip(&b).take_while(|(x, y)| x == y).count();
        let suffix = a[prefix..]
            .iter()
            .rev()
            .zip(b[prefix..].iter().rev())
            .take_while(|(x, y)| x == y)
            .count();

        Self {
            rule: rule.to_string(),
            offset: prefix,
            removed: a[prefix..a.len() - suffix].iter().collect(),
            inserted: b[prefix..b.len() - suffix].iter().collect(),
        }
    }

    /// Short evidence token, e.g. `clean:strip-abstract-label:-9`.
    #[must_use]
    pub fn evidence_token(&self) -> String {
        let delta = self.inserted.chars().count() as i64 - self.removed.chars().count() as i64;
        format!("clean:{}:{delta:+}", self.rule)
    }
}

/// Apply `rules` in order, returning the cleaned value and the changes made.
#[must_use]
pub fn clean(raw: &str, rules: &[CleaningRule]) -> (String, Vec<CleaningChange>) {
    let mut value = raw.to_string();
    let mut log = Vec::new();

    for rule in rules {
        if !rule.applies_to(&value) {
            continue;
        }
        let Some(next) = rule.run(&value) else {
            continue;
        };
        if next != value {
            log.push(CleaningChange::between(&rule.name, &value, &next));
            value = next;
        }
    }

    (value, log)
}

fn strip_abstract_label(value: &str) -> Option<String> {
    Some(LEADING_ABSTRACT_LABEL.replace(value, "").into_owned())
}

fn truncate_boilerplate(value: &str) -> Option<String> {
    Some(TRAILING_BOILERPLATE.replace(value, "").into_owned())
}

fn strip_leading_non_word(value: &str) -> Option<String> {
    Some(LEADING_NON_WORD.replace(value, "").into_owned())
}

fn collapse_whitespace(value: &str) -> Option<String> {
    Some(WHITESPACE_RUN.replace_all(value, " ").trim().to_string())
}

/// Rules for long free text (abstracts), in application order.
#[must_use]
pub fn standard_rules() -> Vec<CleaningRule> {
    vec![
        CleaningRule::new(
            "strip-abstract-label",
            vec![LEADING_ABSTRACT_LABEL.clone()],
            strip_abstract_label,
        ),
        CleaningRule::new(
            "truncate-boilerplate",
            vec![TRAILING_BOILERPLATE.clone()],
            truncate_boilerplate,
        ),
        CleaningRule::new(
            "strip-leading-non-word",
            vec![LEADING_NON_WORD.clone()],
            strip_leading_non_word,
        ),
        whitespace_rule(),
    ]
}

fn whitespace_rule() -> CleaningRule {
    CleaningRule::new("collapse-whitespace", vec![], collapse_whitespace)
}

/// Rules for short values (titles, author names, links).
#[must_use]
pub fn whitespace_rules() -> Vec<CleaningRule> {
    vec![whitespace_rule()]
}

/// Empty out values shorter than `min_chars` characters.
#[must_use]
pub fn min_length_rule(min_chars: usize) -> CleaningRule {
    CleaningRule {
        name: "reject-too-short".to_string(),
        guards: vec![],
        run: RuleFn::MinLength(min_chars),
    }
}

/// Abstract rules followed by the length check.
#[must_use]
pub fn abstract_rules(min_chars: usize) -> Vec<CleaningRule> {
    let mut rules = standard_rules();
    rules.push(min_length_rule(min_chars));
    rules
}

/// Rules for instances of `name`; only abstracts get the length check.
#[must_use]
pub fn rules_for(name: &str, min_abstract_len: usize) -> Vec<CleaningRule> {
    if name == FieldName::Abstract.as_str() {
        abstract_rules(min_abstract_len)
    } else {
        whitespace_rules()
    }
}

/// Clean every instance a chain produced, appending `clean:` evidence
/// tokens and dropping instances left empty. Continues when nothing is left.
#[must_use]
pub fn clean_fields() -> Arrow<Vec<Field>, Vec<Field>> {
    Arrow::new(|found: Vec<Field>, env: Env| {
        let min = env.options().min_abstract_len;
        let name = found.first().map(|f| f.name.clone()).unwrap_or_default();
        let rules = rules_for(&name, min);

        let kept: Vec<Field> = found
            .into_iter()
            .filter_map(|mut field| {
                let (value, changes) = clean(field.value_str(), &rules);
                if value.is_empty() {
                    tracing::trace!(parent: env.span(), field = %field.name, "instance dropped by cleaning");
                    return None;
                }
                field.evidence.extend(changes.iter().map(CleaningChange::evidence_token));
                field.value = Some(value);
                Some(field)
            })
            .collect();

        if kept.is_empty() {
            Outcome::Failure(Control::cont(format!("{name} rejected by cleaning")), env)
        } else {
            Outcome::Success(kept, env)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::test_support::env_for;

    #[test]
    fn test_label_and_references_removed() {
        let (value, log) = clean("Abstract We study X. References [1] Foo.", &standard_rules());
        assert_eq!(value, "We study X.");
        let names: Vec<&str> = log.iter().map(|c| c.rule.as_str()).collect();
        assert_eq!(names, vec!["strip-abstract-label", "truncate-boilerplate", "collapse-whitespace"]);
    }

    #[test]
    fn test_clean_input_is_untouched() {
        let value = "We study move pruning in single-agent search.";
        let (cleaned, log) = clean(value, &standard_rules());
        assert_eq!(cleaned, value);
        assert!(log.is_empty());
    }

    #[test]
    fn test_truncate_keywords_and_disqus() {
        let (v, _) = clean("Text body. Keywords: a, b", &standard_rules());
        assert_eq!(v, "Text body.");
        let (v, _) = clean("Body text. Please enable JavaScript to view the comments powered by Disqus.", &standard_rules());
        assert_eq!(v, "Body text.");
        let (v, _) = clean("Body. Related Material [pdf] [bibtex]", &standard_rules());
        assert_eq!(v, "Body.");
    }

    #[test]
    fn test_label_variants() {
        let (v, _) = clean("ABSTRACT: Results follow.", &standard_rules());
        assert_eq!(v, "Results follow.");
        let (v, _) = clean("Abstractions are useful.", &standard_rules());
        assert_eq!(v, "Abstractions are useful.");
    }

    #[test]
    fn test_leading_non_word_and_whitespace() {
        let (v, log) = clean(" ::  We  show\n\nthat", &standard_rules());
        assert_eq!(v, "We show that");
        assert!(log.iter().any(|c| c.rule == "strip-leading-non-word"));
    }

    #[test]
    fn test_min_length() {
        let (v, log) = clean("Too short.", &abstract_rules(200));
        assert_eq!(v, "");
        assert_eq!(log.last().map(|c| c.rule.as_str()), Some("reject-too-short"));

        let long = "word ".repeat(60);
        let (v, _) = clean(&long, &abstract_rules(200));
        assert_eq!(v, long.trim());
    }

    #[test]
    fn test_guard_checked_against_current_value() {
        // After the label is stripped the value starts with a word, so the
        // non-word rule's guard no longer matches.
        let (_, log) = clean("Abstract. Text", &standard_rules());
        assert!(!log.iter().any(|c| c.rule == "strip-leading-non-word"));
    }

    #[test]
    fn test_clean_fields_records_evidence() {
        let raw = Field::new(FieldName::Title, "  Automatic\n   move pruning ", vec!["meta:[dc.title]".to_string()]);
        let out = clean_fields().apply(vec![raw], env_for("https://example.com/"));
        let Some(found) = out.value() else {
            panic!("title kept");
        };
        assert_eq!(found[0].value_str(), "Automatic move pruning");
        assert_eq!(found[0].evidence[0], "meta:[dc.title]");
        assert!(found[0].evidence[1].starts_with("clean:collapse-whitespace:"));
    }

    #[test]
    fn test_clean_fields_rejects_short_abstract() {
        let raw = Field::new(FieldName::Abstract, "Too short.", vec![]);
        let out = clean_fields().apply(vec![raw], env_for("https://example.com/"));
        assert_eq!(out.control(), Some(&Control::cont("abstract rejected by cleaning")));

        let long = "word ".repeat(60);
        let kept = Field::new(FieldName::Abstract, long, vec![]);
        let short = Field::new(FieldName::Abstract, "Too short.", vec![]);
        let out = clean_fields().apply(vec![short, kept], env_for("https://example.com/"));
        assert_eq!(out.value().map(Vec::len), Some(1));
    }

    #[test]
    fn test_change_record() {
        let change = CleaningChange::between("r", "Abstract We study", "We study");
        assert_eq!(change.offset, 0);
        assert_eq!(change.removed, "Abstract ");
        assert_eq!(change.inserted, "");
        assert_eq!(change.evidence_token(), "clean:r:-9");

        let change = CleaningChange::between("ws", "a  b", "a b");
        assert_eq!(change.offset, 2);
        assert_eq!(change.removed, " ");
        assert_eq!(change.inserted, "");
    }
}
