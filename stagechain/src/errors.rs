//! Error types for stagechain.
//!
//! Stage failures travel through every composition layer untouched: a
//! pipeline or chain hands back exactly the error its failing stage returned.

use thiserror::Error;

/// Result alias used by every stage, handler and fallback.
pub type StageResult<T> = Result<T, StageError>;

/// The error type produced by stages and chain executors.
#[derive(Debug, Error)]
pub enum StageError {
    /// A stage reported a failure.
    #[error("Stage '{stage}' failed: {message}")]
    Failed {
        /// The failing stage.
        stage: String,
        /// What went wrong.
        message: String,
    },

    /// A pipeline was re-entered more often than its configured limit.
    ///
    /// Almost always a pipeline that (transitively) contains itself.
    #[error("Pipeline '{pipeline}' exceeded the maximum nesting depth of {depth}")]
    NestingTooDeep {
        /// The pipeline that tripped the guard.
        pipeline: String,
        /// The configured limit.
        depth: usize,
    },

    /// Any other failure raised from inside a stage.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StageError {
    /// Creates a stage failure.
    #[must_use]
    pub fn failed(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed {
            stage: stage.into(),
            message: message.into(),
        }
    }

    /// Returns the name of the stage that failed, when known.
    #[must_use]
    pub fn stage(&self) -> Option<&str> {
        match self {
            Self::Failed { stage, .. } => Some(stage),
            Self::NestingTooDeep { pipeline, .. } => Some(pipeline),
            Self::Other(_) => None,
        }
    }

    /// Returns a short machine-readable kind, used in emitted events.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Failed { .. } => "stage_failed",
            Self::NestingTooDeep { .. } => "nesting_too_deep",
            Self::Other(_) => "other",
        }
    }
}
