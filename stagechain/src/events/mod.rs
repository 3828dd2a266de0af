//! Event sink system for observability.
//!
//! Pipelines, decorators and handler chains report what they do through an
//! injected [`EventSink`]. Sinks are plain synchronous side-effecting calls;
//! the engine never waits on or retries them.

mod sink;

pub use sink::{
    CollectingEventSink, EventSink, FanOutEventSink, LoggingEventSink, NoOpEventSink,
    RoutingEventSink,
};
