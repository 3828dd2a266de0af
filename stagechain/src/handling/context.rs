//! The per-execution handling record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

/// Something a handler noticed but could not act on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anomaly {
    /// The handler that recorded it.
    pub handler: String,
    /// Description of the problem.
    pub message: String,
}

/// The work item of one chain execution plus its "handled" flag.
///
/// A context is created per execution and passed by `&mut` to each handler
/// in turn; no two executions ever share one.
#[derive(Debug, Clone)]
pub struct HandlingContext<E> {
    subject: E,
    is_handled: bool,
    handled_by: Option<String>,
    run_id: Uuid,
    started_at: DateTime<Utc>,
    anomalies: Vec<Anomaly>,
}

impl<E> HandlingContext<E> {
    /// Creates an unhandled context for `subject`.
    #[must_use]
    pub fn new(subject: E) -> Self {
        Self {
            subject,
            is_handled: false,
            handled_by: None,
            run_id: Uuid::now_v7(),
            started_at: Utc::now(),
            anomalies: Vec::new(),
        }
    }

    /// Returns the work item.
    pub fn subject(&self) -> &E {
        &self.subject
    }

    /// Consumes the context, returning the work item.
    pub fn into_subject(self) -> E {
        self.subject
    }

    /// Returns true once a handler has claimed the work.
    #[must_use]
    pub fn is_handled(&self) -> bool {
        self.is_handled
    }

    /// Marks the work as handled by `handler`.
    pub fn mark_handled(&mut self, handler: impl Into<String>) {
        self.is_handled = true;
        self.handled_by = Some(handler.into());
    }

    /// Returns the handler that claimed the work.
    pub fn handled_by(&self) -> Option<&str> {
        self.handled_by.as_deref()
    }

    /// Returns the unique id of this execution.
    #[must_use]
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Returns when this execution started.
    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Records a problem with the subject and logs it.
    ///
    /// Handlers use this when they accept a subject they cannot process:
    /// they record why and leave the work unclaimed.
    pub fn record_anomaly(&mut self, handler: impl Into<String>, message: impl Into<String>) {
        let anomaly = Anomaly {
            handler: handler.into(),
            message: message.into(),
        };
        warn!(
            run_id = %self.run_id,
            handler = %anomaly.handler,
            "{}", anomaly.message
        );
        self.anomalies.push(anomaly);
    }

    /// Returns the anomalies recorded so far.
    pub fn anomalies(&self) -> &[Anomaly] {
        &self.anomalies
    }
}
