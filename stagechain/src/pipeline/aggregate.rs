//! The aggregating pipeline: an ordered list of stages that always runs in full.

use super::depth::NestingGuard;
use super::PipelineConfig;
use crate::errors::StageResult;
use crate::events::EventSink;
use crate::observability::SpanTimer;
use crate::stages::Stage;
use parking_lot::RwLock;
use serde_json::json;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, debug_span, warn};

type StageList<T> = Vec<Arc<dyn Stage<T>>>;

/// An ordered sequence of stages executed one after another.
///
/// Every execution runs every stage exactly once, in insertion order, feeding
/// each stage's output to the next. There is no short-circuit: the only way
/// a run ends early is a stage failure, which is returned unchanged.
///
/// `Pipeline` is a handle: clones share the same stage list, and the pipeline
/// is itself a [`Stage`], so it can be nested inside other pipelines. Stages
/// appended through any handle are seen by every later execution, including
/// executions of an outer pipeline the handle is nested in.
pub struct Pipeline<T> {
    config: Arc<PipelineConfig>,
    stages: Arc<RwLock<StageList<T>>>,
    sink: Option<Arc<dyn EventSink>>,
}

impl<T> Pipeline<T> {
    /// Creates an empty pipeline.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(PipelineConfig::new(name))
    }

    /// Creates an empty pipeline from a configuration.
    #[must_use]
    pub fn with_config(config: PipelineConfig) -> Self {
        Self {
            config: Arc::new(config),
            stages: Arc::new(RwLock::new(Vec::new())),
            sink: None,
        }
    }

    /// Creates a pipeline holding `stages` in the given order.
    #[must_use]
    pub fn from_stages(name: impl Into<String>, stages: Vec<Arc<dyn Stage<T>>>) -> Self {
        let pipeline = Self::new(name);
        *pipeline.stages.write() = stages;
        pipeline
    }

    /// Sets the sink that receives pipeline and stage events.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Adds a stage to the end, consuming and returning the pipeline.
    #[must_use]
    pub fn with_stage<S>(self, stage: S) -> Self
    where
        S: Stage<T> + 'static,
    {
        self.append(stage);
        self
    }

    /// Appends a stage to the end of the pipeline.
    ///
    /// Returns the pipeline so appends can be chained. The new stage is seen
    /// by executions that start after this call; executions already running
    /// keep the stage list they started with.
    pub fn append<S>(&self, stage: S) -> &Self
    where
        S: Stage<T> + 'static,
    {
        self.append_shared(Arc::new(stage))
    }

    /// Appends an already shared stage.
    pub fn append_shared(&self, stage: Arc<dyn Stage<T>>) -> &Self {
        debug!(pipeline = %self.config.name, stage = stage.name(), "Appending stage");
        self.stages.write().push(stage);
        self
    }

    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Returns the pipeline configuration.
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.read().len()
    }

    /// Returns true if the pipeline has no stages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.read().is_empty()
    }

    /// Returns the stage names in execution order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<String> {
        self.stages
            .read()
            .iter()
            .map(|stage| stage.name().to_string())
            .collect()
    }

    fn snapshot(&self) -> StageList<T> {
        self.stages.read().clone()
    }

    fn emit(&self, event_type: &str, data: serde_json::Value) {
        if let Some(sink) = &self.sink {
            sink.emit(event_type, Some(data));
        }
    }
}

impl<T> Clone for Pipeline<T> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            stages: Arc::clone(&self.stages),
            sink: self.sink.clone(),
        }
    }
}

impl<T> fmt::Debug for Pipeline<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("name", &self.config.name)
            .field("stages", &self.stage_names())
            .finish()
    }
}

impl<T> Stage<T> for Pipeline<T> {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn execute(&self, input: T) -> StageResult<T> {
        let _nesting = NestingGuard::enter(
            Arc::as_ptr(&self.stages) as usize,
            &self.config.name,
            self.config.max_nesting_depth,
        )?;

        // The lock is released before any stage runs, so a stage may append
        // to the pipeline that is executing it.
        let stages = self.snapshot();
        let span = debug_span!("pipeline", pipeline = %self.config.name, stages = stages.len());
        let _entered = span.enter();

        let timer = SpanTimer::start(self.config.name.as_str());
        self.emit(
            "pipeline.started",
            json!({"pipeline": self.config.name, "stage_count": stages.len()}),
        );

        let mut value = input;
        for (index, stage) in stages.iter().enumerate() {
            let stage_timer = SpanTimer::start(stage.name());
            match stage.execute(value) {
                Ok(next) => {
                    value = next;
                    if self.config.emit_stage_events {
                        self.emit(
                            "stage.completed",
                            json!({
                                "pipeline": self.config.name,
                                "stage": stage.name(),
                                "index": index,
                                "duration_ms": stage_timer.finish(),
                            }),
                        );
                    }
                }
                Err(err) => {
                    warn!(stage = stage.name(), index, error = %err, "Stage failed, aborting pipeline");
                    self.emit(
                        "stage.failed",
                        json!({
                            "pipeline": self.config.name,
                            "stage": stage.name(),
                            "index": index,
                            "error": err.to_string(),
                            "error_kind": err.kind(),
                        }),
                    );
                    return Err(err);
                }
            }
        }

        let duration_ms = timer.finish();
        debug!(duration_ms, "Pipeline completed");
        self.emit(
            "pipeline.completed",
            json!({"pipeline": self.config.name, "duration_ms": duration_ms}),
        );
        Ok(value)
    }
}
