//! Pipeline configuration.

use serde::{Deserialize, Serialize};

/// Default limit on how many times one pipeline may be active on a call stack.
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 64;

/// Structural configuration for a pipeline.
///
/// Configuration is purely structural: nothing here is read from files or
/// environment variables by the engine itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Pipeline name, reported in logs and events.
    pub name: String,
    /// How many times this pipeline may be active on one call stack before
    /// execution fails with `StageError::NestingTooDeep`. Distinct pipelines
    /// nested inside it do not count.
    pub max_nesting_depth: usize,
    /// Whether a `stage.completed` event is emitted after every stage.
    pub emit_stage_events: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            name: "pipeline".to_string(),
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
            emit_stage_events: true,
        }
    }
}

impl PipelineConfig {
    /// Creates a config with the given name and default limits.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets the maximum nesting depth.
    #[must_use]
    pub fn with_max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }

    /// Enables or disables per-stage events.
    #[must_use]
    pub fn with_stage_events(mut self, enabled: bool) -> Self {
        self.emit_stage_events = enabled;
        self
    }
}
