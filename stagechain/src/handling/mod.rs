//! Handler chains: short-circuiting dispatch of one work item.
//!
//! Each execution owns a fresh [`HandlingContext`]. Handlers are visited in
//! their configured order; the first one that marks the context handled
//! stops the chain. When nobody claims the work, the executor's
//! [`Fallback`] runs exactly once, so work is never silently dropped.
//!
//! Handlers declare what they claim through [`Handler::accepts`], a predicate
//! over the subject (typically a match on an enum variant), instead of
//! inspecting runtime types.

mod context;
mod executor;
mod handler;
#[cfg(test)]
mod integration_tests;

pub use context::{Anomaly, HandlingContext};
pub use executor::{ChainExecutor, Disposition, Fallback, FnFallback, Outcome};
pub use handler::{FnHandler, Handler, HandlerLink, Unclaimed};
