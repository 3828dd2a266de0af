//! Stage trait and implementations.
//!
//! Stages are the fundamental units of work in a stagechain pipeline. A stage
//! consumes a value of a fixed type and produces a value of the same type, so
//! any number of them can be composed into aggregating pipelines or linked
//! chains.

mod decorators;

pub use decorators::{Recover, Traced};

use crate::errors::StageResult;
use std::sync::Arc;

/// Trait for pipeline stages.
///
/// Implementations must not assume where they sit in a chain: the same stage
/// has to behave identically whether it runs first, in the middle or last.
/// Side effects are allowed; failures are reported through the returned
/// result and are propagated unchanged by every composition layer.
pub trait Stage<T>: Send + Sync {
    /// Returns the name of the stage.
    fn name(&self) -> &str;

    /// Executes the stage.
    ///
    /// # Arguments
    ///
    /// * `input` - The value produced by the previous stage
    ///
    /// # Returns
    ///
    /// The transformed value, or the failure that aborts the chain.
    fn execute(&self, input: T) -> StageResult<T>;
}

impl<T, S> Stage<T> for Arc<S>
where
    S: Stage<T> + ?Sized,
{
    fn name(&self) -> &str {
        (**self).name()
    }

    fn execute(&self, input: T) -> StageResult<T> {
        (**self).execute(input)
    }
}

impl<T, S> Stage<T> for Box<S>
where
    S: Stage<T> + ?Sized,
{
    fn name(&self) -> &str {
        (**self).name()
    }

    fn execute(&self, input: T) -> StageResult<T> {
        (**self).execute(input)
    }
}

/// The terminal stage of a chain: returns its input unchanged.
///
/// Every linked chain ends here, so delegation never reaches an undefined
/// next step.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl<T> Stage<T> for Identity {
    fn name(&self) -> &str {
        "identity"
    }

    fn execute(&self, input: T) -> StageResult<T> {
        Ok(input)
    }
}

/// A simple function-based stage.
pub struct FnStage<F> {
    name: String,
    func: F,
}

impl<F> FnStage<F> {
    /// Creates a new function-based stage.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> std::fmt::Debug for FnStage<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnStage")
            .field("name", &self.name)
            .finish()
    }
}

impl<T, F> Stage<T> for FnStage<F>
where
    F: Fn(T) -> StageResult<T> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self, input: T) -> StageResult<T> {
        (self.func)(input)
    }
}
