//! Event sink trait and implementations.

use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, error, info, trace, warn, Level};

/// Trait for event sinks that can receive events.
///
/// Event sinks are used throughout stagechain for logging and analytics.
/// Emitting must never fail the chain that reports the event.
pub trait EventSink: Send + Sync {
    /// Emits an event.
    ///
    /// # Arguments
    ///
    /// * `event_type` - The type of event (e.g., "stage.completed")
    /// * `data` - Optional event data
    fn emit(&self, event_type: &str, data: Option<serde_json::Value>);
}

/// A no-op event sink that discards all events.
///
/// Used as the default when no sink is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

impl EventSink for NoOpEventSink {
    fn emit(&self, _event_type: &str, _data: Option<serde_json::Value>) {}
}

/// An event sink that logs events using the tracing framework.
#[derive(Debug, Clone)]
pub struct LoggingEventSink {
    level: Level,
}

impl Default for LoggingEventSink {
    fn default() -> Self {
        Self { level: Level::INFO }
    }
}

impl LoggingEventSink {
    /// Creates a new logging event sink with the specified level.
    #[must_use]
    pub fn new(level: Level) -> Self {
        Self { level }
    }

    /// Creates a debug-level logging sink.
    #[must_use]
    pub fn debug() -> Self {
        Self::new(Level::DEBUG)
    }

    /// Creates an info-level logging sink.
    #[must_use]
    pub fn info() -> Self {
        Self::new(Level::INFO)
    }

    /// Returns the level events are logged at.
    #[must_use]
    pub fn level(&self) -> Level {
        self.level
    }
}

impl EventSink for LoggingEventSink {
    fn emit(&self, event_type: &str, data: Option<serde_json::Value>) {
        match self.level {
            Level::TRACE => trace!(event_type = %event_type, event_data = ?data, "Event: {}", event_type),
            Level::DEBUG => debug!(event_type = %event_type, event_data = ?data, "Event: {}", event_type),
            Level::WARN => warn!(event_type = %event_type, event_data = ?data, "Event: {}", event_type),
            Level::ERROR => error!(event_type = %event_type, event_data = ?data, "Event: {}", event_type),
            _ => info!(event_type = %event_type, event_data = ?data, "Event: {}", event_type),
        }
    }
}

/// Forwards every event to each of its sinks, in order.
///
/// A fan-out sink is itself a sink, so fan-outs nest.
#[derive(Clone, Default)]
pub struct FanOutEventSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl FanOutEventSink {
    /// Creates a fan-out over the given sinks.
    #[must_use]
    pub fn new(sinks: Vec<Arc<dyn EventSink>>) -> Self {
        Self { sinks }
    }

    /// Adds a sink to the end of the fan-out.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Returns the number of sinks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// Returns true if there are no sinks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl std::fmt::Debug for FanOutEventSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FanOutEventSink")
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

impl EventSink for FanOutEventSink {
    fn emit(&self, event_type: &str, data: Option<serde_json::Value>) {
        for sink in &self.sinks {
            sink.emit(event_type, data.clone());
        }
    }
}

type RoutePredicate = dyn Fn(&str, Option<&serde_json::Value>) -> bool + Send + Sync;

/// Sends each event to exactly one of two sinks.
///
/// Events the predicate selects go to the hot sink, everything else to the
/// cold sink. Either side may itself be a [`FanOutEventSink`].
pub struct RoutingEventSink {
    is_hot: Box<RoutePredicate>,
    hot: Arc<dyn EventSink>,
    cold: Arc<dyn EventSink>,
}

impl RoutingEventSink {
    /// Routes events for which `is_hot` returns true to `hot`.
    pub fn new<P>(is_hot: P, hot: Arc<dyn EventSink>, cold: Arc<dyn EventSink>) -> Self
    where
        P: Fn(&str, Option<&serde_json::Value>) -> bool + Send + Sync + 'static,
    {
        Self {
            is_hot: Box::new(is_hot),
            hot,
            cold,
        }
    }

    /// Routes failures and fallbacks to `hot`, everything else to `cold`.
    ///
    /// Hot events are `*.failed`, `handling.fallback`, and any event whose
    /// payload carries `"ok": false`.
    #[must_use]
    pub fn failures(hot: Arc<dyn EventSink>, cold: Arc<dyn EventSink>) -> Self {
        Self::new(
            |event_type, data| {
                event_type.ends_with(".failed")
                    || event_type == "handling.fallback"
                    || data.and_then(|d| d.get("ok")) == Some(&serde_json::Value::Bool(false))
            },
            hot,
            cold,
        )
    }
}

impl std::fmt::Debug for RoutingEventSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoutingEventSink").finish_non_exhaustive()
    }
}

impl EventSink for RoutingEventSink {
    fn emit(&self, event_type: &str, data: Option<serde_json::Value>) {
        if (self.is_hot)(event_type, data.as_ref()) {
            self.hot.emit(event_type, data);
        } else {
            self.cold.emit(event_type, data);
        }
    }
}

/// A collecting event sink for testing purposes.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: RwLock<Vec<(String, Option<serde_json::Value>)>>,
}

impl CollectingEventSink {
    /// Creates a new collecting sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected events.
    #[must_use]
    pub fn events(&self) -> Vec<(String, Option<serde_json::Value>)> {
        self.events.read().clone()
    }

    /// Returns the collected event types, in emission order.
    #[must_use]
    pub fn event_types(&self) -> Vec<String> {
        self.events.read().iter().map(|(t, _)| t.clone()).collect()
    }

    /// Returns the number of collected events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Returns true if no events have been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Clears all collected events.
    pub fn clear(&self) {
        self.events.write().clear();
    }

    /// Returns events matching a type prefix.
    #[must_use]
    pub fn events_of_type(&self, type_prefix: &str) -> Vec<(String, Option<serde_json::Value>)> {
        self.events
            .read()
            .iter()
            .filter(|(t, _)| t.starts_with(type_prefix))
            .cloned()
            .collect()
    }
}

impl EventSink for CollectingEventSink {
    fn emit(&self, event_type: &str, data: Option<serde_json::Value>) {
        self.events.write().push((event_type.to_string(), data));
    }
}
