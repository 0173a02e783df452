//! Line-sequence matcher.
//!
//! Finds the first run of css-norm lines matching a sequence of patterns,
//! then extracts the text of the block that follows it.
//!
//! Pattern syntax: a pattern starting with `| ` matches a text line whose
//! text matches the remainder (as a regex); a pattern starting with `## `
//! does the same for comment-body lines; any other pattern is a regex
//! matched at the start of an element line (after indentation), so `h2`
//! matches `h2 .title` but not a text line mentioning h2.

use regex::Regex;

use super::Page;
use crate::control::{Arrow, Control, Env, Outcome};
use crate::normalize::css_norm::{indent_of, text_of};

/// Where the extracted block sits relative to the matched lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineMatchOptions {
    /// Lines to skip (or, if negative, back up) after the matched run.
    pub line_offset: isize,
    /// Maximum block length in lines; `0` means unbounded.
    pub line_count: usize,
    /// Added to the indentation of the first block line to get the minimum
    /// indentation the block may keep.
    pub indent_offset: isize,
    /// Pattern sequence ending the block (searched from the block start).
    pub evidence_end: Vec<String>,
}

impl LineMatchOptions {
    #[must_use]
    pub fn offset(line_offset: isize) -> Self {
        Self {
            line_offset,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn count(mut self, line_count: usize) -> Self {
        self.line_count = line_count;
        self
    }

    #[must_use]
    pub fn indent(mut self, indent_offset: isize) -> Self {
        self.indent_offset = indent_offset;
        self
    }

    #[must_use]
    pub fn until(mut self, evidence_end: &[&str]) -> Self {
        self.evidence_end = evidence_end.iter().map(ToString::to_string).collect();
        self
    }
}

/// Compile one line pattern (see module docs for the syntax).
pub fn compile_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    let anchored = if let Some(text) = pattern.strip_prefix("| ") {
        format!(r"^\| (?:{text})")
    } else if let Some(comment) = pattern.strip_prefix("## ") {
        format!(r"^## (?:{comment})")
    } else {
        format!(r"^(?:{pattern})")
    };
    Regex::new(&anchored)
}

fn compile_all(patterns: &[String]) -> Result<Vec<Regex>, regex::Error> {
    patterns.iter().map(|p| compile_pattern(p)).collect()
}

/// First index `i >= from` where `lines[i..i + patterns.len()]` match.
///
/// Every matched line after the first must be indented at least as deeply
/// as the first, keeping the run inside the block it starts.
fn find_run(lines: &[String], patterns: &[Regex], from: usize) -> Option<usize> {
    if patterns.is_empty() || lines.len() < patterns.len() {
        return None;
    }
    (from..=lines.len() - patterns.len()).find(|&i| {
        let anchor = indent_of(&lines[i]);
        patterns.iter().enumerate().all(|(j, re)| {
            let line = &lines[i + j];
            (j == 0 || indent_of(line) >= anchor) && re.is_match(line.trim_start())
        })
    })
}

/// Extract the text block following the first run matching `patterns`.
///
/// The block is `[start, end)` with `start = i + patterns.len() + line_offset`
/// and `end` bounded by `line_count` (when non-zero), by the next run
/// matching `evidence_end` found from `start`, and by the document end. It
/// is then cut to its contiguous prefix indented at least
/// `indent_of(lines[start]) + indent_offset`. Text lines in that prefix are
/// joined with single spaces.
///
/// Returns `None` when nothing matches or the block holds no text.
#[must_use]
pub fn find_by_line_match(
    lines: &[String],
    patterns: &[Regex],
    opts: &LineMatchOptions,
    evidence_end: &[Regex],
) -> Option<String> {
    let i = find_run(lines, patterns, 0)?;

    let start = (i + patterns.len()).checked_add_signed(opts.line_offset)?;
    if start >= lines.len() {
        return None;
    }

    let mut end = lines.len();
    if opts.line_count > 0 {
        end = end.min(start + opts.line_count);
    }
    if let Some(stop) = find_run(lines, evidence_end, start) {
        end = end.min(stop);
    }

    let min_indent = indent_of(&lines[start]).saturating_add_signed(opts.indent_offset);
    let text: Vec<&str> = lines[start..end]
        .iter()
        .take_while(|line| indent_of(line) >= min_indent)
        .filter_map(|line| text_of(line))
        .collect();

    if text.is_empty() {
        None
    } else {
        Some(text.join(" "))
    }
}

/// Arrow form of [`find_by_line_match`].
///
/// Records `lines:[p1 / p2 / ...]` as evidence. A pattern that fails to
/// compile makes the arrow always continue (and logs a warning) rather than
/// panicking.
#[must_use]
pub fn line_match(patterns: &[&str], opts: LineMatchOptions) -> Arrow<Page, String> {
    let source: Vec<String> = patterns.iter().map(ToString::to_string).collect();
    let token = format!("lines:[{}]", source.join(" / "));

    let compiled = compile_all(&source).and_then(|p| compile_all(&opts.evidence_end).map(|e| (p, e)));
    let (patterns, evidence_end) = match compiled {
        Ok(both) => both,
        Err(e) => {
            tracing::warn!(rule = %token, error = %e, "invalid line pattern, rule disabled");
            let reason = format!("invalid pattern in {token}");
            return Arrow::new(move |_, env| Outcome::Failure(Control::cont(reason.clone()), env));
        }
    };

    Arrow::new(move |page: Page, mut env: Env| {
        match find_by_line_match(&page.lines, &patterns, &opts, &evidence_end) {
            Some(text) => {
                env.push_evidence(token.clone());
                Outcome::Success(text, env)
            }
            None => Outcome::Failure(Control::cont(format!("no match for {token}")), env),
        }
    })
}
