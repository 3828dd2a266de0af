//! Chain nodes and the step contract.

use crate::errors::StageResult;
use crate::stages::{Identity, Stage};
use std::fmt;

/// The node-local logic of a linked chain.
///
/// `next` is the rest of the chain. A step that does not call
/// `next.execute` stops the chain at this node.
pub trait Step<T>: Send + Sync {
    /// Returns the name of the step.
    fn name(&self) -> &str;

    /// Runs this step, delegating to `next` whenever it chooses to.
    fn run(&self, input: T, next: &dyn Stage<T>) -> StageResult<T>;
}

/// A step built from a closure.
pub struct FnStep<F> {
    name: String,
    func: F,
}

impl<F> FnStep<F> {
    /// Creates a new function-based step.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> fmt::Debug for FnStep<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnStep").field("name", &self.name).finish()
    }
}

impl<T, F> Step<T> for FnStep<F>
where
    F: Fn(T, &dyn Stage<T>) -> StageResult<T> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, input: T, next: &dyn Stage<T>) -> StageResult<T> {
        (self.func)(input, next)
    }
}

/// Turns any stage into a step: run the stage, then hand its output on.
#[derive(Debug, Clone)]
pub struct StageStep<S> {
    stage: S,
}

impl<S> StageStep<S> {
    /// Wraps a stage.
    pub fn new(stage: S) -> Self {
        Self { stage }
    }

    /// Returns the wrapped stage.
    pub fn into_inner(self) -> S {
        self.stage
    }
}

impl<T, S> Step<T> for StageStep<S>
where
    S: Stage<T>,
{
    fn name(&self) -> &str {
        self.stage.name()
    }

    fn run(&self, input: T, next: &dyn Stage<T>) -> StageResult<T> {
        let output = self.stage.execute(input)?;
        next.execute(output)
    }
}

enum Next<T> {
    Terminal,
    Link(Box<Link<T>>),
    Stage(Box<dyn Stage<T>>),
}

/// One node of a linked chain.
///
/// A link owns its step and, exclusively, its next stage. Without explicit
/// wiring the next stage is the terminal identity.
pub struct Link<T> {
    step: Box<dyn Step<T>>,
    next: Next<T>,
}

impl<T> Link<T> {
    /// Creates a terminal-closed link.
    pub fn new<S>(step: S) -> Self
    where
        S: Step<T> + 'static,
    {
        Self {
            step: Box::new(step),
            next: Next::Terminal,
        }
    }

    /// Creates a link that delegates to `next`.
    pub fn with_next<S, N>(step: S, next: N) -> Self
    where
        S: Step<T> + 'static,
        N: Stage<T> + 'static,
    {
        let mut link = Self::new(step);
        link.set_next_step(next);
        link
    }

    /// Consumes the link and returns it wired to `next`.
    #[must_use]
    pub fn then(mut self, next: Self) -> Self {
        self.set_next_link(next);
        self
    }

    /// Rebinds this link's next stage.
    ///
    /// Wiring is a construction-phase operation; the `&mut` receiver keeps it
    /// from racing an execution of the same chain.
    pub fn set_next_step<N>(&mut self, next: N)
    where
        N: Stage<T> + 'static,
    {
        self.next = Next::Stage(Box::new(next));
    }

    /// Rebinds this link's next stage to another link.
    ///
    /// Unlike [`set_next_step`](Self::set_next_step), the chain stays
    /// walkable, so [`chain_len`](Self::chain_len) and tail lookups see
    /// through it.
    pub fn set_next_link(&mut self, next: Self) {
        self.next = Next::Link(Box::new(next));
    }

    /// Closes the chain at this link.
    pub fn set_terminal(&mut self) {
        self.next = Next::Terminal;
    }

    /// Returns true if this link delegates straight to the terminal.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self.next, Next::Terminal)
    }

    /// Returns the step name.
    pub fn step_name(&self) -> &str {
        self.step.name()
    }

    /// Counts the links reachable from here, this one included.
    ///
    /// Stages bound with `set_next_step` are opaque and count as one.
    #[must_use]
    pub fn chain_len(&self) -> usize {
        match &self.next {
            Next::Terminal => 1,
            Next::Stage(_) => 2,
            Next::Link(next) => 1 + next.chain_len(),
        }
    }

    pub(crate) fn names(&self, out: &mut Vec<String>) {
        out.push(self.step.name().to_string());
        match &self.next {
            Next::Terminal => {}
            Next::Stage(stage) => out.push(stage.name().to_string()),
            Next::Link(next) => next.names(out),
        }
    }

    pub(crate) fn tail(&self) -> &Self {
        match &self.next {
            Next::Link(next) => next.tail(),
            _ => self,
        }
    }

    pub(crate) fn tail_mut(&mut self) -> &mut Self {
        match self.next {
            Next::Link(ref mut next) => next.tail_mut(),
            _ => self,
        }
    }

    fn next_stage(&self) -> &dyn Stage<T> {
        match &self.next {
            Next::Terminal => &Identity,
            Next::Link(next) => &**next,
            Next::Stage(stage) => &**stage,
        }
    }
}

impl<T> fmt::Debug for Link<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = Vec::new();
        self.names(&mut names);
        f.debug_struct("Link").field("chain", &names).finish()
    }
}

impl<T> Stage<T> for Link<T> {
    fn name(&self) -> &str {
        self.step.name()
    }

    fn execute(&self, input: T) -> StageResult<T> {
        self.step.run(input, self.next_stage())
    }
}
