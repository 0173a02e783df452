//! Document normalization stages.
//!
//! A fetched artifact passes through a strict pipeline of normal forms:
//! `original` (decoded response body) → `tidy-norm` (re-serialized,
//! well-formed HTML) → `css-norm` (indented line serialization used by the
//! pattern matchers). Each stage depends only on its predecessor's output
//! and is cached independently by [`crate::cache::ContentCache`].

pub mod css_norm;
pub mod tidy;

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// One stage of the normalization pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NormalForm {
    /// Decoded response body.
    Original,
    /// Parsed and re-serialized HTML.
    TidyNorm,
    /// CSS-tree normal form lines.
    CssNorm,
}

impl NormalForm {
    /// All stages in pipeline order.
    pub const ALL: [Self; 3] = [Self::Original, Self::TidyNorm, Self::CssNorm];

    /// Stage name as used in cache file names and evidence tokens.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::TidyNorm => "tidy-norm",
            Self::CssNorm => "css-norm",
        }
    }

    /// The stage this one is computed from.
    #[must_use]
    pub const fn predecessor(self) -> Option<Self> {
        match self {
            Self::Original => None,
            Self::TidyNorm => Some(Self::Original),
            Self::CssNorm => Some(Self::TidyNorm),
        }
    }

    /// Compute this stage from the output of its predecessor.
    ///
    /// `Original` has no predecessor and is returned unchanged.
    #[must_use]
    pub fn compute(self, input: &str) -> String {
        match self {
            Self::Original => input.to_string(),
            Self::TidyNorm => tidy::tidy_html(input),
            Self::CssNorm => css_norm::serialize_html(input).join("\n"),
        }
    }
}

impl fmt::Display for NormalForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NormalForm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| Error::Cache(format!("unknown normal form: {s}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order() {
        assert_eq!(NormalForm::CssNorm.predecessor(), Some(NormalForm::TidyNorm));
        assert_eq!(NormalForm::TidyNorm.predecessor(), Some(NormalForm::Original));
        assert_eq!(NormalForm::Original.predecessor(), None);
    }

    #[test]
    fn test_round_trip_names() {
        for stage in NormalForm::ALL {
            assert_eq!(stage.as_str().parse::<NormalForm>().ok(), Some(stage));
        }
        assert!("css".parse::<NormalForm>().is_err());
    }
}
