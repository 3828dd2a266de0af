//! Decorator stages: stages that own an inner stage and wrap calls to it.

use crate::errors::{StageError, StageResult};
use crate::events::EventSink;
use crate::observability::SpanTimer;
use crate::stages::Stage;
use serde_json::json;
use std::fmt;
use std::sync::Arc;
use tracing::{debug_span, warn};

/// Reports `stage.begin` and `stage.end` around every call to the inner stage.
///
/// `stage.end` is emitted for failed calls too, with `"ok": false`; the
/// failure itself is returned unchanged.
pub struct Traced<S> {
    inner: S,
    sink: Arc<dyn EventSink>,
}

impl<S> Traced<S> {
    /// Wraps `inner`, reporting to `sink`.
    pub fn new(inner: S, sink: Arc<dyn EventSink>) -> Self {
        Self { inner, sink }
    }

    /// Returns the wrapped stage.
    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S> fmt::Debug for Traced<S>
where
    S: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Traced").field("inner", &self.inner).finish()
    }
}

impl<T, S> Stage<T> for Traced<S>
where
    S: Stage<T>,
{
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn execute(&self, input: T) -> StageResult<T> {
        let name = self.inner.name();
        let span = debug_span!("stage", stage = name);
        let _entered = span.enter();

        self.sink.emit("stage.begin", Some(json!({"stage": name})));
        let timer = SpanTimer::start(name);
        let result = self.inner.execute(input);
        self.sink.emit(
            "stage.end",
            Some(json!({
                "stage": name,
                "ok": result.is_ok(),
                "duration_ms": timer.finish(),
            })),
        );
        result
    }
}

/// Fault isolation: converts a failure of the inner stage into a substitute
/// value.
///
/// This is the only place a failure stops propagating; everywhere else the
/// engine hands errors back untouched.
pub struct Recover<S, F> {
    inner: S,
    fallback: F,
}

impl<S, F> Recover<S, F> {
    /// Wraps `inner`; `fallback` builds the substitute output from the error.
    pub fn new(inner: S, fallback: F) -> Self {
        Self { inner, fallback }
    }
}

impl<S, F> fmt::Debug for Recover<S, F>
where
    S: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Recover").field("inner", &self.inner).finish()
    }
}

impl<T, S, F> Stage<T> for Recover<S, F>
where
    S: Stage<T>,
    F: Fn(&StageError) -> T + Send + Sync,
{
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn execute(&self, input: T) -> StageResult<T> {
        match self.inner.execute(input) {
            Ok(output) => Ok(output),
            Err(err) => {
                warn!(stage = self.inner.name(), error = %err, "Recovered stage failure");
                Ok((self.fallback)(&err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::CollectingEventSink;
    use crate::stages::FnStage;
    use crate::testing::FailingStage;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Clone, PartialEq)]
    struct Response {
        status: u16,
    }

    fn ok_handler() -> FnStage<impl Fn(Response) -> StageResult<Response> + Send + Sync> {
        FnStage::new("ok", |_: Response| Ok(Response { status: 200 }))
    }

    #[test]
    fn test_traced_reports_around_inner_call() {
        let sink = Arc::new(CollectingEventSink::new());
        let stage = Traced::new(ok_handler(), sink.clone());

        assert_eq!(stage.execute(Response { status: 0 }).unwrap(), Response { status: 200 });
        assert_eq!(Stage::<Response>::name(&stage), "ok");
        assert_eq!(sink.event_types(), vec!["stage.begin", "stage.end"]);
        assert_eq!(sink.events()[1].1.as_ref().unwrap()["ok"], true);
    }

    #[test]
    fn test_traced_reports_failure_and_propagates() {
        let sink = Arc::new(CollectingEventSink::new());
        let stage = Traced::new(FailingStage::new("flaky", "timeout"), sink.clone());

        let err = Stage::<i64>::execute(&stage, 1).unwrap_err();

        assert_eq!(err.to_string(), "Stage 'flaky' failed: timeout");
        assert_eq!(sink.events()[1].1.as_ref().unwrap()["ok"], false);
    }

    #[test]
    fn test_recover_substitutes_failure() {
        let stage = Recover::new(FailingStage::new("handler", "panic in handler"), |_: &StageError| {
            Response { status: 500 }
        });

        assert_eq!(stage.execute(Response { status: 0 }).unwrap(), Response { status: 500 });
    }

    #[test]
    fn test_recover_passes_success_through() {
        let stage = Recover::new(ok_handler(), |_: &StageError| Response { status: 500 });

        assert_eq!(stage.execute(Response { status: 0 }).unwrap(), Response { status: 200 });
    }

    #[test]
    fn test_recover_around_traced_decorator_stack() {
        let sink = Arc::new(CollectingEventSink::new());
        let stage = Recover::new(
            Traced::new(FailingStage::new("ok", "broken"), sink.clone()),
            |_: &StageError| Response { status: 500 },
        );

        assert_eq!(stage.execute(Response { status: 0 }).unwrap(), Response { status: 500 });
        assert_eq!(sink.len(), 2);
    }
}
