//! Evidence/control algebra.
//!
//! Every extraction step returns an [`Outcome`]: a success carrying a value,
//! or a failure carrying a [`Control`] instruction. "Not found" and "cannot
//! process this document" are data in this model, never errors or panics.
//! The [`Env`] travels on both branches so evidence gathered so far is never
//! lost.
//!
//! Steps are packaged as [`Arrow`]s and composed with the combinators in
//! [`combinators`].

pub mod combinators;

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::cache::ContentCache;
use crate::entry::EntryMetadata;
use crate::normalize::NormalForm;
use crate::options::Options;

pub use combinators::{
    attempt_series, bind, continue_with, for_each_do, gather_all, halt_with, through, tap,
    with_evidence, Arrow,
};

/// Why a step did not produce a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Control {
    /// Unrecoverable for this attempt-chain (wrong content type, bad status, unreadable file).
    Halt(Option<String>),
    /// This strategy found nothing; try the next alternative.
    Continue(Option<String>),
}

impl Control {
    #[must_use]
    pub fn halt(reason: impl Into<String>) -> Self {
        Self::Halt(Some(reason.into()))
    }

    #[must_use]
    pub fn cont(reason: impl Into<String>) -> Self {
        Self::Continue(Some(reason.into()))
    }

    #[must_use]
    pub fn is_halt(&self) -> bool {
        matches!(self, Self::Halt(_))
    }

    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Halt(r) | Self::Continue(r) => r.as_deref(),
        }
    }
}

impl fmt::Display for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_halt() { "halt" } else { "continue" };
        match self.reason() {
            Some(reason) => write!(f, "{kind}: {reason}"),
            None => f.write_str(kind),
        }
    }
}

/// Result of one step, with the environment on both branches.
#[derive(Debug, Clone)]
pub enum Outcome<A> {
    Success(A, Env),
    Failure(Control, Env),
}

impl<A> Outcome<A> {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(..))
    }

    #[must_use]
    pub fn env(&self) -> &Env {
        match self {
            Self::Success(_, env) | Self::Failure(_, env) => env,
        }
    }

    /// Value of a success.
    #[must_use]
    pub fn value(&self) -> Option<&A> {
        match self {
            Self::Success(a, _) => Some(a),
            Self::Failure(..) => None,
        }
    }

    /// Control instruction of a failure.
    #[must_use]
    pub fn control(&self) -> Option<&Control> {
        match self {
            Self::Success(..) => None,
            Self::Failure(c, _) => Some(c),
        }
    }

    /// Map the success value, leaving failures untouched.
    #[must_use]
    pub fn map<B>(self, f: impl FnOnce(A) -> B) -> Outcome<B> {
        match self {
            Self::Success(a, env) => Outcome::Success(f(a), env),
            Self::Failure(c, env) => Outcome::Failure(c, env),
        }
    }

    /// Split into the value-or-control and the environment.
    pub fn into_parts(self) -> (Result<A, Control>, Env) {
        match self {
            Self::Success(a, env) => (Ok(a), env),
            Self::Failure(c, env) => (Err(c), env),
        }
    }
}

/// Per-entry state shared (read-only) by every environment of one run.
#[derive(Debug)]
pub struct EntryContext {
    pub entry_dir: PathBuf,
    pub metadata: EntryMetadata,
    pub cache: ContentCache,
    pub options: Options,
}

impl EntryContext {
    /// Context for an entry, with a cache honouring `options.use_cache`.
    #[must_use]
    pub fn new(entry_dir: impl Into<PathBuf>, metadata: EntryMetadata, options: Options) -> Self {
        let entry_dir = entry_dir.into();
        let cache = if options.use_cache {
            ContentCache::new(&entry_dir)
        } else {
            ContentCache::disabled(&entry_dir)
        };
        Self {
            entry_dir,
            metadata,
            cache,
            options,
        }
    }
}

/// The threaded state of one extraction attempt.
///
/// Cloning an `Env` copies its evidence list, so branches that fan out from
/// one environment never see each other's evidence.
///
/// Besides evidence, an environment keeps the messages of alternatives that
/// failed on the way to it, so a document nothing matched can report every
/// halt and continue reason.
#[derive(Debug, Clone)]
pub struct Env {
    ctx: Arc<EntryContext>,
    artifact: String,
    input: NormalForm,
    evidence: Vec<String>,
    failures: Vec<String>,
    span: tracing::Span,
}

impl Env {
    /// Fresh environment for one artifact of an entry.
    #[must_use]
    pub fn new(ctx: Arc<EntryContext>, artifact: impl Into<String>) -> Self {
        let artifact = artifact.into();
        let span = tracing::debug_span!(
            "extract",
            entry = %ctx.entry_dir.display(),
            artifact = %artifact,
        );
        Self {
            ctx,
            artifact,
            input: NormalForm::Original,
            evidence: Vec::new(),
            failures: Vec::new(),
            span,
        }
    }

    #[must_use]
    pub fn context(&self) -> &EntryContext {
        &self.ctx
    }

    #[must_use]
    pub fn options(&self) -> &Options {
        &self.ctx.options
    }

    #[must_use]
    pub fn metadata(&self) -> &EntryMetadata {
        &self.ctx.metadata
    }

    #[must_use]
    pub fn cache(&self) -> &ContentCache {
        &self.ctx.cache
    }

    /// Final URL of the document.
    #[must_use]
    pub fn response_url(&self) -> &str {
        &self.ctx.metadata.response_url
    }

    #[must_use]
    pub fn artifact(&self) -> &str {
        &self.artifact
    }

    /// Normal form currently used as matcher input.
    #[must_use]
    pub fn input(&self) -> NormalForm {
        self.input
    }

    pub fn set_input(&mut self, stage: NormalForm) {
        self.input = stage;
    }

    #[must_use]
    pub fn evidence(&self) -> &[String] {
        &self.evidence
    }

    pub fn push_evidence(&mut self, token: impl Into<String>) {
        self.evidence.push(token.into());
    }

    /// Messages of failed alternatives, oldest first.
    #[must_use]
    pub fn failures(&self) -> &[String] {
        &self.failures
    }

    /// A copy for a branch: same evidence, no failure messages.
    #[must_use]
    pub fn branch(&self) -> Self {
        Self {
            failures: Vec::new(),
            ..self.clone()
        }
    }

    /// Keep the failure messages of a branch that ended with `control`.
    ///
    /// Reasonless controls (such as a URL guard that did not match) add
    /// nothing of their own.
    pub fn absorb_failure(&mut self, branch: Env, control: &Control) {
        self.failures.extend(branch.failures);
        if control.reason().is_some() {
            self.failures.push(control.to_string());
        }
    }

    /// Span carrying this attempt's `entry`/`artifact` fields.
    #[must_use]
    pub fn span(&self) -> &tracing::Span {
        &self.span
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Environment over a throwaway entry with the given response URL.
    pub fn env_for(url: &str) -> Env {
        env_with(url, Options::default())
    }

    /// Like [`env_for`] with explicit options; cache and outputs stay off.
    pub fn env_with(url: &str, options: Options) -> Env {
        let ctx = EntryContext::new(
            std::env::temp_dir().join("biblio-extract-unused-entry"),
            EntryMetadata::for_url(url),
            Options {
                use_cache: false,
                write_outputs: false,
                ..options
            },
        );
        Env::new(Arc::new(ctx), crate::entry::RESPONSE_BODY)
    }
}
