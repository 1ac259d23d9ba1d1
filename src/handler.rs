//! Cooperative cancellation.
//!
//! Long-running operations poll a [`ComputationHandler`] at well-defined
//! points. A negative answer unwinds the current call chain with a
//! [`Canceled`] error; nothing computed by the unwound calls is committed to
//! the apply cache or the vtree stack.
//!
//! | Event | Polled |
//! |-------|--------|
//! | [`ComputationEvent::ComputationStarted`] | on entry to `apply_with`, the transformations and `minimize` |
//! | [`ComputationEvent::SddApply`] | on every apply cache miss |
//! | [`ComputationEvent::SddTransformation`] | once per rotation/swap call |
//! | [`ComputationEvent::MinimizationStarted`] | once per `minimize` call |
//! | [`ComputationEvent::LocalSearchStarted`] | at every searched vtree node |
//! | [`ComputationEvent::MinimizationStep`] | after every fragment trial |
//! | [`ComputationEvent::MinimizationPass`] | after every pass |

use std::fmt::{self, Display};
use std::time::{Duration, Instant};

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComputationEvent {
    ComputationStarted,
    SddApply,
    SddTransformation,
    MinimizationStarted,
    LocalSearchStarted,
    /// A fragment state was measured.
    MinimizationStep { size: usize },
    /// A full local search pass finished.
    MinimizationPass { size: usize },
}

impl Display for ComputationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComputationEvent::ComputationStarted => write!(f, "computation started"),
            ComputationEvent::SddApply => write!(f, "sdd apply"),
            ComputationEvent::SddTransformation => write!(f, "sdd transformation"),
            ComputationEvent::MinimizationStarted => write!(f, "minimization started"),
            ComputationEvent::LocalSearchStarted => write!(f, "local search started"),
            ComputationEvent::MinimizationStep { size } => write!(f, "minimization step, size = {}", size),
            ComputationEvent::MinimizationPass { size } => write!(f, "minimization pass, size = {}", size),
        }
    }
}

/// The computation was canceled by a handler.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("computation canceled on event: {event}")]
pub struct Canceled {
    pub event: ComputationEvent,
}

pub type Cancelable<T> = Result<T, Canceled>;

/// Outcome of an operation that can stop early with a usable result.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Computation<T> {
    Done(T),
    /// Canceled, but with the best result found so far.
    Partial(T, ComputationEvent),
    Canceled(ComputationEvent),
}

impl<T> Computation<T> {
    pub fn is_done(&self) -> bool {
        matches!(self, Computation::Done(_))
    }

    pub fn is_canceled(&self) -> bool {
        matches!(self, Computation::Canceled(_))
    }

    /// The result, if any was produced.
    pub fn result(self) -> Option<T> {
        match self {
            Computation::Done(t) | Computation::Partial(t, _) => Some(t),
            Computation::Canceled(_) => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Computation<U> {
        match self {
            Computation::Done(t) => Computation::Done(f(t)),
            Computation::Partial(t, event) => Computation::Partial(f(t), event),
            Computation::Canceled(event) => Computation::Canceled(event),
        }
    }
}

impl<T> From<Cancelable<T>> for Computation<T> {
    fn from(value: Cancelable<T>) -> Self {
        match value {
            Ok(t) => Computation::Done(t),
            Err(Canceled { event }) => Computation::Canceled(event),
        }
    }
}

pub trait ComputationHandler {
    fn should_resume(&mut self, event: &ComputationEvent) -> bool;
}

impl<F> ComputationHandler for F
where
    F: FnMut(&ComputationEvent) -> bool,
{
    fn should_resume(&mut self, event: &ComputationEvent) -> bool {
        self(event)
    }
}

/// Polls `handler` and turns a refusal into [`Canceled`].
pub fn check(handler: &mut dyn ComputationHandler, event: ComputationEvent) -> Cancelable<()> {
    if handler.should_resume(&event) {
        Ok(())
    } else {
        Err(Canceled { event })
    }
}

/// Unwraps the result of a computation that ran under [`NopHandler`].
pub(crate) fn uncancelable<T>(result: Cancelable<T>) -> T {
    match result {
        Ok(t) => t,
        Err(canceled) => unreachable!("{} under a handler that never cancels", canceled),
    }
}

/// Never cancels.
#[derive(Debug, Default, Clone, Copy)]
pub struct NopHandler;

impl ComputationHandler for NopHandler {
    fn should_resume(&mut self, _event: &ComputationEvent) -> bool {
        true
    }
}

/// Cancels once more than `limit` matching events were seen.
pub struct EventLimitHandler {
    matcher: fn(&ComputationEvent) -> bool,
    limit: usize,
    seen: usize,
}

impl EventLimitHandler {
    pub fn new(matcher: fn(&ComputationEvent) -> bool, limit: usize) -> Self {
        Self { matcher, limit, seen: 0 }
    }

    /// Limits the number of apply cache misses.
    pub fn apply_calls(limit: usize) -> Self {
        Self::new(|e| matches!(e, ComputationEvent::SddApply), limit)
    }

    /// Limits the number of measured fragment states.
    pub fn minimization_steps(limit: usize) -> Self {
        Self::new(|e| matches!(e, ComputationEvent::MinimizationStep { .. }), limit)
    }

    pub fn seen(&self) -> usize {
        self.seen
    }
}

impl ComputationHandler for EventLimitHandler {
    fn should_resume(&mut self, event: &ComputationEvent) -> bool {
        if (self.matcher)(event) {
            self.seen += 1;
        }
        self.seen <= self.limit
    }
}

/// Cancels after a wall-clock deadline.
#[derive(Debug, Clone, Copy)]
pub struct TimeoutHandler {
    deadline: Instant,
}

impl TimeoutHandler {
    pub fn new(timeout: Duration) -> Self {
        Self {
            deadline: Instant::now() + timeout,
        }
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self { deadline }
    }
}

impl ComputationHandler for TimeoutHandler {
    fn should_resume(&mut self, _event: &ComputationEvent) -> bool {
        Instant::now() < self.deadline
    }
}

/// Consults two handlers; resumes only if both agree.
///
/// Both handlers see every event. Which of them refused is recorded, so a
/// caller can tell a local search budget from a user cancellation.
pub struct CompositeHandler<'a> {
    outer: &'a mut dyn ComputationHandler,
    inner: &'a mut dyn ComputationHandler,
    outer_refused: bool,
    inner_refused: bool,
}

impl<'a> CompositeHandler<'a> {
    pub fn new(outer: &'a mut dyn ComputationHandler, inner: &'a mut dyn ComputationHandler) -> Self {
        Self {
            outer,
            inner,
            outer_refused: false,
            inner_refused: false,
        }
    }

    pub fn outer_refused(&self) -> bool {
        self.outer_refused
    }

    pub fn inner_refused(&self) -> bool {
        self.inner_refused
    }
}

impl ComputationHandler for CompositeHandler<'_> {
    fn should_resume(&mut self, event: &ComputationEvent) -> bool {
        let outer = self.outer.should_resume(event);
        let inner = self.inner.should_resume(event);
        self.outer_refused |= !outer;
        self.inner_refused |= !inner;
        outer && inner
    }
}

/// Produces a fresh handler for every local search.
pub trait SearchHandlerFactory {
    fn create(&self) -> Box<dyn ComputationHandler>;
}

impl<F> SearchHandlerFactory for F
where
    F: Fn() -> Box<dyn ComputationHandler>,
{
    fn create(&self) -> Box<dyn ComputationHandler> {
        self()
    }
}

/// Local searches without their own budget.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnboundedSearch;

impl SearchHandlerFactory for UnboundedSearch {
    fn create(&self) -> Box<dyn ComputationHandler> {
        Box::new(NopHandler)
    }
}
