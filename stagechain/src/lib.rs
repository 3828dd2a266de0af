//! # Stagechain
//!
//! Composable stage chains for Rust.
//!
//! A stage consumes a value of a fixed type and produces a value of the same
//! type. Stagechain composes stages in two ways:
//!
//! - **Aggregating pipelines**: an ordered list that always runs every stage,
//!   threading the value through. Pipelines are stages themselves, so they
//!   nest, and they can grow while in use.
//! - **Linked chains**: each node owns the next stage and decides when (and
//!   whether) to delegate to it, which gives before/after decorators and
//!   early stops.
//!
//! For request handling, [`handling::ChainExecutor`] runs handlers against a
//! per-execution [`handling::HandlingContext`], stops at the first one that
//! claims the work and runs a fallback when nobody does.
//!
//! ## Quick Start
//!
//! ```rust
//! use stagechain::prelude::*;
//!
//! let pipeline = Pipeline::new("arith")
//!     .with_stage(FnStage::new("add", |x: i64| Ok(x + 1)))
//!     .with_stage(FnStage::new("double", |x: i64| Ok(x * 2)));
//!
//! assert_eq!(pipeline.execute(4).unwrap(), 10);
//! ```
//!
//! Execution is synchronous and runs to completion on the caller's thread.

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod chain;
pub mod errors;
pub mod events;
pub mod handling;
pub mod observability;
pub mod pipeline;
pub mod stages;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::chain::{FnStep, Link, LinkedPipeline, StageStep, Step};
    pub use crate::errors::{StageError, StageResult};
    pub use crate::events::{
        CollectingEventSink, EventSink, FanOutEventSink, LoggingEventSink, NoOpEventSink,
        RoutingEventSink,
    };
    pub use crate::handling::{
        ChainExecutor, Disposition, Fallback, FnFallback, FnHandler, Handler, HandlerLink,
        HandlingContext, Unclaimed,
    };
    pub use crate::pipeline::{Pipeline, PipelineConfig};
    pub use crate::stages::{FnStage, Identity, Recover, Stage, Traced};
}
