//! Arrows and the combinators that compose them.
//!
//! An [`Arrow<A, B>`] is a shareable step `(A, Env) -> Outcome<B>`. Running
//! an arrow on a failed outcome passes the failure through untouched, which
//! is what makes sequential composition short-circuit.

use std::sync::Arc;

use super::{Control, Env, Outcome};

type ArrowFn<A, B> = dyn Fn(A, Env) -> Outcome<B> + Send + Sync;

/// A composable extraction step.
pub struct Arrow<A, B> {
    f: Arc<ArrowFn<A, B>>,
}

impl<A, B> Clone for Arrow<A, B> {
    fn clone(&self) -> Self {
        Self {
            f: Arc::clone(&self.f),
        }
    }
}

impl<A: 'static, B: 'static> Arrow<A, B> {
    #[must_use]
    pub fn new(f: impl Fn(A, Env) -> Outcome<B> + Send + Sync + 'static) -> Self {
        Self { f: Arc::new(f) }
    }

    /// Run on a value.
    pub fn apply(&self, input: A, env: Env) -> Outcome<B> {
        (self.f)(input, env)
    }

    /// Run on an outcome; failures short-circuit without invoking the step.
    pub fn run(&self, input: Outcome<A>) -> Outcome<B> {
        match input {
            Outcome::Success(a, env) => self.apply(a, env),
            Outcome::Failure(control, env) => Outcome::Failure(control, env),
        }
    }

    /// Sequential composition: `self` then `next`.
    #[must_use]
    pub fn then<C: 'static>(self, next: Arrow<B, C>) -> Arrow<A, C> {
        Arrow::new(move |a, env| next.run(self.apply(a, env)))
    }
}

/// Lift a step function into an arrow.
#[must_use]
pub fn bind<A: 'static, B: 'static>(
    f: impl Fn(A, Env) -> Outcome<B> + Send + Sync + 'static,
) -> Arrow<A, B> {
    Arrow::new(f)
}

/// Apply `arrow` to every element independently, gathering the successes.
///
/// Each element runs against its own clone of the environment, so evidence
/// recorded by one branch is invisible to the others. Failed elements are
/// dropped. The resulting environment is the input environment unchanged.
#[must_use]
pub fn for_each_do<A: 'static, B: 'static>(arrow: Arrow<A, B>) -> Arrow<Vec<A>, Vec<B>> {
    Arrow::new(move |items: Vec<A>, env: Env| {
        let mut gathered = Vec::with_capacity(items.len());
        for item in items {
            match arrow.apply(item, env.clone()) {
                Outcome::Success(b, _) => gathered.push(b),
                Outcome::Failure(control, _) => {
                    tracing::trace!(parent: env.span(), %control, "fan-out branch dropped");
                }
            }
        }
        Outcome::Success(gathered, env)
    })
}

/// Try alternatives in order against the same input; the first success wins.
///
/// Later alternatives are not invoked once one succeeds. A failing
/// alternative (halt or continue) only ends that alternative. When every
/// alternative fails, or there are none, the result is `Continue` and the
/// environment carries the failed alternatives' messages.
#[must_use]
pub fn attempt_series<A: Clone + 'static, B: 'static>(arrows: Vec<Arrow<A, B>>) -> Arrow<A, B> {
    Arrow::new(move |a: A, mut env: Env| {
        for (n, arrow) in arrows.iter().enumerate() {
            match arrow.apply(a.clone(), env.branch()) {
                success @ Outcome::Success(..) => return success,
                Outcome::Failure(control, branch) => {
                    tracing::trace!(parent: env.span(), alternative = n, %control, "alternative failed");
                    env.absorb_failure(branch, &control);
                }
            }
        }
        Outcome::Failure(Control::Continue(None), env)
    })
}

/// Run every arrow against the same input and concatenate their outputs.
///
/// Like [`for_each_do`] each arrow gets its own environment clone. Fails
/// with `Continue` when no arrow succeeds, keeping every arrow's failure
/// messages.
#[must_use]
pub fn gather_all<A: Clone + 'static, B: 'static>(
    arrows: Vec<Arrow<A, Vec<B>>>,
) -> Arrow<A, Vec<B>> {
    Arrow::new(move |a: A, mut env: Env| {
        let mut gathered = Vec::new();
        let mut any = false;
        for arrow in &arrows {
            match arrow.apply(a.clone(), env.branch()) {
                Outcome::Success(found, _) => {
                    any = true;
                    gathered.extend(found);
                }
                Outcome::Failure(control, branch) => env.absorb_failure(branch, &control),
            }
        }
        if any {
            Outcome::Success(gathered, env)
        } else {
            Outcome::Failure(Control::cont("no alternative produced a value"), env)
        }
    })
}

/// Run a side effect on the value, passing it through unchanged.
#[must_use]
pub fn tap<A: 'static>(f: impl Fn(&A, &Env) + Send + Sync + 'static) -> Arrow<A, A> {
    Arrow::new(move |a, env| {
        f(&a, &env);
        Outcome::Success(a, env)
    })
}

/// Replace the value with `f(value)` without touching control flow.
#[must_use]
pub fn through<A: 'static, B: 'static>(f: impl Fn(A, &Env) -> B + Send + Sync + 'static) -> Arrow<A, B> {
    Arrow::new(move |a, env| {
        let b = f(a, &env);
        Outcome::Success(b, env)
    })
}

/// Record an evidence token and pass the value through.
#[must_use]
pub fn with_evidence<A: 'static>(token: impl Into<String>) -> Arrow<A, A> {
    let token: String = token.into();
    Arrow::new(move |a, mut env: Env| {
        env.push_evidence(token.clone());
        Outcome::Success(a, env)
    })
}

/// An arrow that always halts with `reason`.
#[must_use]
pub fn halt_with<A: 'static, B: 'static>(reason: impl Into<String>) -> Arrow<A, B> {
    let reason: String = reason.into();
    Arrow::new(move |_, env| Outcome::Failure(Control::halt(reason.clone()), env))
}

/// An arrow that always continues with `reason`.
#[must_use]
pub fn continue_with<A: 'static, B: 'static>(reason: impl Into<String>) -> Arrow<A, B> {
    let reason: String = reason.into();
    Arrow::new(move |_, env| Outcome::Failure(Control::cont(reason.clone()), env))
}
