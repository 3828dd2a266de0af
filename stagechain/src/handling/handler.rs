//! The handler contract and linked handler chains.

use super::HandlingContext;
use crate::errors::StageResult;
use std::fmt;
use std::sync::Arc;

/// A stage of a handler chain.
///
/// `accepts` declares which subjects the handler claims; the chain only
/// calls `handle` for accepted subjects. `handle` either marks the context
/// handled or leaves it for the rest of the chain.
pub trait Handler<E>: Send + Sync {
    /// Returns the name of the handler.
    fn name(&self) -> &str;

    /// Returns true if this handler wants to look at `subject`.
    fn accepts(&self, _subject: &E) -> bool {
        true
    }

    /// Attempts to handle the work in `ctx`.
    fn handle(&self, ctx: &mut HandlingContext<E>) -> StageResult<()>;
}

impl<E, H> Handler<E> for Arc<H>
where
    H: Handler<E> + ?Sized,
{
    fn name(&self) -> &str {
        (**self).name()
    }

    fn accepts(&self, subject: &E) -> bool {
        (**self).accepts(subject)
    }

    fn handle(&self, ctx: &mut HandlingContext<E>) -> StageResult<()> {
        (**self).handle(ctx)
    }
}

impl<E, H> Handler<E> for Box<H>
where
    H: Handler<E> + ?Sized,
{
    fn name(&self) -> &str {
        (**self).name()
    }

    fn accepts(&self, subject: &E) -> bool {
        (**self).accepts(subject)
    }

    fn handle(&self, ctx: &mut HandlingContext<E>) -> StageResult<()> {
        (**self).handle(ctx)
    }
}

/// The terminal handler: accepts nothing, claims nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unclaimed;

impl<E> Handler<E> for Unclaimed {
    fn name(&self) -> &str {
        "unclaimed"
    }

    fn accepts(&self, _subject: &E) -> bool {
        false
    }

    fn handle(&self, _ctx: &mut HandlingContext<E>) -> StageResult<()> {
        Ok(())
    }
}

/// A handler built from a predicate and a closure.
pub struct FnHandler<P, F> {
    name: String,
    predicate: P,
    func: F,
}

impl<P, F> FnHandler<P, F> {
    /// Creates a handler that runs `func` for subjects matching `predicate`.
    pub fn new(name: impl Into<String>, predicate: P, func: F) -> Self {
        Self {
            name: name.into(),
            predicate,
            func,
        }
    }
}

impl<P, F> fmt::Debug for FnHandler<P, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHandler").field("name", &self.name).finish()
    }
}

impl<E, P, F> Handler<E> for FnHandler<P, F>
where
    P: Fn(&E) -> bool + Send + Sync,
    F: Fn(&mut HandlingContext<E>) -> StageResult<()> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn accepts(&self, subject: &E) -> bool {
        (self.predicate)(subject)
    }

    fn handle(&self, ctx: &mut HandlingContext<E>) -> StageResult<()> {
        (self.func)(ctx)
    }
}

/// A node of a linked handler chain.
///
/// Runs its own handler when it accepts the subject, then delegates to its
/// next handler unless the context has been claimed. The next handler
/// defaults to [`Unclaimed`].
pub struct HandlerLink<E> {
    handler: Box<dyn Handler<E>>,
    next: Box<dyn Handler<E>>,
}

impl<E> HandlerLink<E> {
    /// Creates a link ending in the terminal handler.
    pub fn new<H>(handler: H) -> Self
    where
        H: Handler<E> + 'static,
    {
        Self {
            handler: Box::new(handler),
            next: Box::new(Unclaimed),
        }
    }

    /// Creates a link that delegates to `next`.
    pub fn with_next<H, N>(handler: H, next: N) -> Self
    where
        H: Handler<E> + 'static,
        N: Handler<E> + 'static,
    {
        let mut link = Self::new(handler);
        link.set_next_step(next);
        link
    }

    /// Rebinds the next handler. Construction phase only.
    pub fn set_next_step<N>(&mut self, next: N)
    where
        N: Handler<E> + 'static,
    {
        self.next = Box::new(next);
    }
}

impl<E> fmt::Debug for HandlerLink<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerLink")
            .field("handler", &self.handler.name())
            .field("next", &self.next.name())
            .finish()
    }
}

impl<E> Handler<E> for HandlerLink<E> {
    fn name(&self) -> &str {
        self.handler.name()
    }

    fn handle(&self, ctx: &mut HandlingContext<E>) -> StageResult<()> {
        if self.handler.accepts(ctx.subject()) {
            self.handler.handle(ctx)?;
        }
        if ctx.is_handled() || !self.next.accepts(ctx.subject()) {
            return Ok(());
        }
        self.next.handle(ctx)
    }
}
