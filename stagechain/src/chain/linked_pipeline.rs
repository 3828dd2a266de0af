//! A builder that keeps a linked chain terminal-closed while it grows.

use super::{Link, StageStep, Step};
use crate::errors::StageResult;
use crate::pipeline::depth::NestingGuard;
use crate::pipeline::PipelineConfig;
use crate::stages::Stage;
use std::fmt;
use tracing::{debug, debug_span};

/// A linked chain assembled by appending steps.
///
/// After every append the chain reads `first -> ... -> last -> terminal`:
/// the appended link is rebound to the terminal and the previous tail is
/// rebound to the appended link. An empty linked pipeline is the identity.
pub struct LinkedPipeline<T> {
    config: PipelineConfig,
    head: Option<Link<T>>,
    len: usize,
}

impl<T> LinkedPipeline<T> {
    /// Creates an empty linked pipeline.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(PipelineConfig::new(name))
    }

    /// Creates an empty linked pipeline from a configuration.
    #[must_use]
    pub fn with_config(config: PipelineConfig) -> Self {
        Self {
            config,
            head: None,
            len: 0,
        }
    }

    /// Appends a step to the end of the chain.
    pub fn append<S>(&mut self, step: S) -> &mut Self
    where
        S: Step<T> + 'static,
    {
        self.append_link(Link::new(step))
    }

    /// Appends a plain stage, which runs and then hands its output on.
    pub fn append_stage<S>(&mut self, stage: S) -> &mut Self
    where
        S: Stage<T> + 'static,
    {
        self.append(StageStep::new(stage))
    }

    /// Appends an existing link.
    ///
    /// Whatever the link was wired to before is dropped: it becomes the new
    /// tail and points at the terminal.
    pub fn append_link(&mut self, mut link: Link<T>) -> &mut Self {
        link.set_terminal();
        debug!(pipeline = %self.config.name, step = link.step_name(), "Appending link");

        match self.head.as_mut() {
            None => self.head = Some(link),
            Some(head) => head.tail_mut().set_next_link(link),
        }
        self.len += 1;
        self
    }

    /// Adds a step, consuming and returning the pipeline.
    #[must_use]
    pub fn with_step<S>(mut self, step: S) -> Self
    where
        S: Step<T> + 'static,
    {
        self.append(step);
        self
    }

    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Returns the number of links.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if no steps were appended.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the step names from head to tail.
    #[must_use]
    pub fn step_names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.len);
        if let Some(head) = &self.head {
            head.names(&mut names);
        }
        names
    }

    /// Returns true if the last link delegates to the terminal.
    #[must_use]
    pub fn is_terminal_closed(&self) -> bool {
        self.head.as_ref().map_or(true, |head| head.tail().is_terminal())
    }
}

impl<T> fmt::Debug for LinkedPipeline<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkedPipeline")
            .field("name", &self.config.name)
            .field("steps", &self.step_names())
            .finish()
    }
}

impl<T> Stage<T> for LinkedPipeline<T> {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn execute(&self, input: T) -> StageResult<T> {
        let _nesting = NestingGuard::enter(
            (self as *const Self) as usize,
            &self.config.name,
            self.config.max_nesting_depth,
        )?;
        let span = debug_span!("linked_pipeline", pipeline = %self.config.name, links = self.len);
        let _entered = span.enter();

        match &self.head {
            None => Ok(input),
            Some(head) => head.execute(input),
        }
    }
}
