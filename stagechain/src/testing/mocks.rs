//! Instrumented stages and handlers for testing.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::errors::{StageError, StageResult};
use crate::handling::{Fallback, Handler, HandlingContext};
use crate::stages::Stage;

/// Appends its marker to the value, making execution order observable.
#[derive(Debug, Clone)]
pub struct RecordingStage {
    marker: String,
}

impl RecordingStage {
    /// Creates a stage named after its marker.
    #[must_use]
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }
}

impl Stage<Vec<String>> for RecordingStage {
    fn name(&self) -> &str {
        &self.marker
    }

    fn execute(&self, mut input: Vec<String>) -> StageResult<Vec<String>> {
        input.push(self.marker.clone());
        Ok(input)
    }
}

/// Passes any value through and counts how often it ran.
#[derive(Debug, Default)]
pub struct CountingStage {
    name: String,
    calls: AtomicUsize,
}

impl CountingStage {
    /// Creates a new counting stage.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Returns the number of times the stage ran.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl<T> Stage<T> for CountingStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self, input: T) -> StageResult<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(input)
    }
}

/// A stage that always fails.
#[derive(Debug, Clone)]
pub struct FailingStage {
    name: String,
    message: String,
}

impl FailingStage {
    /// Creates a new failing stage.
    #[must_use]
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }
}

impl<T> Stage<T> for FailingStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self, _input: T) -> StageResult<T> {
        Err(StageError::failed(&self.name, &self.message))
    }
}

/// A stage that fails the test if it is ever executed.
#[derive(Debug, Clone)]
pub struct ForbiddenStage {
    name: String,
}

impl ForbiddenStage {
    /// Creates a new forbidden stage.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl<T> Stage<T> for ForbiddenStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self, _input: T) -> StageResult<T> {
        panic!("stage '{}' must not be executed", self.name)
    }
}

/// A handler that accepts everything and fails the test if it is reached.
#[derive(Debug, Clone)]
pub struct ForbiddenHandler {
    name: String,
}

impl ForbiddenHandler {
    /// Creates a new forbidden handler.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl<E> Handler<E> for ForbiddenHandler {
    fn name(&self) -> &str {
        &self.name
    }

    fn handle(&self, _ctx: &mut HandlingContext<E>) -> StageResult<()> {
        panic!("handler '{}' must not be reached", self.name)
    }
}

/// A fallback that only counts how often it ran.
#[derive(Debug, Default)]
pub struct CountingFallback {
    calls: AtomicUsize,
}

impl CountingFallback {
    /// Creates a new counting fallback.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of times the fallback ran.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl<E> Fallback<E> for CountingFallback {
    fn on_unhandled(&self, _ctx: &mut HandlingContext<E>) -> StageResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_stage() {
        let stage = RecordingStage::new("a");

        assert_eq!(stage.name(), "a");
        assert_eq!(stage.execute(vec!["x".to_string()]).unwrap(), vec!["x", "a"]);
    }

    #[test]
    fn test_counting_stage() {
        let stage = CountingStage::new("count");
        stage.execute(1).unwrap();
        stage.execute("two").unwrap();

        assert_eq!(stage.calls(), 2);
    }

    #[test]
    fn test_failing_stage() {
        let err = FailingStage::new("f", "always").execute(1).unwrap_err();
        assert_eq!(err.to_string(), "Stage 'f' failed: always");
    }

    #[test]
    #[should_panic(expected = "must not be executed")]
    fn test_forbidden_stage_panics() {
        let _ = ForbiddenStage::new("never").execute(1);
    }

    #[test]
    #[should_panic(expected = "must not be reached")]
    fn test_forbidden_handler_panics() {
        let mut ctx = HandlingContext::new(());
        let _ = ForbiddenHandler::new("never").handle(&mut ctx);
    }

    #[test]
    fn test_counting_fallback() {
        let fallback = CountingFallback::new();
        fallback.on_unhandled(&mut HandlingContext::new(1)).unwrap();

        assert_eq!(fallback.calls(), 1);
    }
}
