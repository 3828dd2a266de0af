//! Ordered handler dispatch with an exhaustion fallback.

use super::{Handler, HandlingContext};
use crate::errors::StageResult;
use crate::events::EventSink;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, debug_span, trace, warn};

/// The "no handler matched" policy of a [`ChainExecutor`].
pub trait Fallback<E>: Send + Sync {
    /// Called once per execution in which no handler claimed the work.
    fn on_unhandled(&self, ctx: &mut HandlingContext<E>) -> StageResult<()>;
}

impl<E, F> Fallback<E> for Arc<F>
where
    F: Fallback<E> + ?Sized,
{
    fn on_unhandled(&self, ctx: &mut HandlingContext<E>) -> StageResult<()> {
        (**self).on_unhandled(ctx)
    }
}

/// A fallback built from a closure.
pub struct FnFallback<F> {
    func: F,
}

impl<F> FnFallback<F> {
    /// Wraps a closure.
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> fmt::Debug for FnFallback<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnFallback").finish_non_exhaustive()
    }
}

impl<E, F> Fallback<E> for FnFallback<F>
where
    F: Fn(&mut HandlingContext<E>) -> StageResult<()> + Send + Sync,
{
    fn on_unhandled(&self, ctx: &mut HandlingContext<E>) -> StageResult<()> {
        (self.func)(ctx)
    }
}

/// How an execution ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum Disposition {
    /// A handler claimed the work.
    Handled {
        /// The claiming handler.
        handler: String,
    },
    /// Every handler declined and the fallback ran.
    FellBack,
}

impl Disposition {
    /// Returns true if a handler claimed the work.
    #[must_use]
    pub fn is_handled(&self) -> bool {
        matches!(self, Self::Handled { .. })
    }
}

/// The disposition of an execution together with its finished context.
#[derive(Debug)]
pub struct Outcome<E> {
    /// How the execution ended.
    pub disposition: Disposition,
    /// The context after the last handler (or the fallback) ran.
    pub context: HandlingContext<E>,
}

/// Runs a fixed, ordered list of handlers against one work item at a time.
///
/// Handlers are visited in the order they were added. The first handler
/// that marks the context handled ends the execution; later handlers never
/// run. If the list is exhausted with the work unclaimed, the fallback runs
/// exactly once. A handler failure aborts the execution and is returned
/// unchanged; the fallback does not run in that case.
pub struct ChainExecutor<E> {
    name: String,
    handlers: Vec<Box<dyn Handler<E>>>,
    fallback: Box<dyn Fallback<E>>,
    sink: Option<Arc<dyn EventSink>>,
}

impl<E> ChainExecutor<E> {
    /// Creates an executor with no handlers and the given fallback.
    pub fn new<F>(fallback: F) -> Self
    where
        F: Fallback<E> + 'static,
    {
        Self {
            name: "handler_chain".to_string(),
            handlers: Vec::new(),
            fallback: Box::new(fallback),
            sink: None,
        }
    }

    /// Sets the executor name used in logs and events.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the sink that receives handling events.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Adds a handler after the existing ones.
    #[must_use]
    pub fn with_handler<H>(mut self, handler: H) -> Self
    where
        H: Handler<E> + 'static,
    {
        self.push(handler);
        self
    }

    /// Adds a handler after the existing ones.
    pub fn push<H>(&mut self, handler: H) -> &mut Self
    where
        H: Handler<E> + 'static,
    {
        self.handlers.push(Box::new(handler));
        self
    }

    /// Returns the executor name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns true if there are no handlers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Returns the handler names in dispatch order.
    #[must_use]
    pub fn handler_names(&self) -> Vec<&str> {
        self.handlers.iter().map(|h| h.name()).collect()
    }

    /// Dispatches `subject` through the chain.
    pub fn handle(&self, subject: E) -> StageResult<Disposition> {
        self.dispatch(subject).map(|outcome| outcome.disposition)
    }

    /// Dispatches `subject` and also returns the finished context.
    pub fn dispatch(&self, subject: E) -> StageResult<Outcome<E>> {
        let mut ctx = HandlingContext::new(subject);
        let span = debug_span!("handler_chain", chain = %self.name, run_id = %ctx.run_id());
        let _entered = span.enter();

        for handler in &self.handlers {
            if !handler.accepts(ctx.subject()) {
                trace!(handler = handler.name(), "Handler declined subject");
                continue;
            }

            handler.handle(&mut ctx)?;

            if ctx.is_handled() {
                let claimed_by = ctx.handled_by().unwrap_or(handler.name()).to_string();
                debug!(handler = %claimed_by, "Work claimed");
                self.emit(
                    "handling.claimed",
                    json!({
                        "chain": self.name,
                        "run_id": ctx.run_id().to_string(),
                        "handler": claimed_by,
                    }),
                );
                return Ok(Outcome {
                    disposition: Disposition::Handled { handler: claimed_by },
                    context: ctx,
                });
            }
        }

        warn!(
            handlers = self.handlers.len(),
            anomalies = ctx.anomalies().len(),
            "No handler claimed the work, running fallback"
        );
        self.emit(
            "handling.fallback",
            json!({
                "chain": self.name,
                "run_id": ctx.run_id().to_string(),
                "anomalies": ctx.anomalies(),
            }),
        );
        self.fallback.on_unhandled(&mut ctx)?;

        Ok(Outcome {
            disposition: Disposition::FellBack,
            context: ctx,
        })
    }

    fn emit(&self, event_type: &str, data: serde_json::Value) {
        if let Some(sink) = &self.sink {
            sink.emit(event_type, Some(data));
        }
    }
}

impl<E> fmt::Debug for ChainExecutor<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainExecutor")
            .field("name", &self.name)
            .field("handlers", &self.handler_names())
            .finish_non_exhaustive()
    }
}
