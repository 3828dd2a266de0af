//! Testing utilities for stagechain pipelines.
//!
//! This module provides:
//! - Instrumented stages, handlers and fallbacks
//! - A small columnar table with transformation stages
//! - Assertions for markers and handling dispositions
//!
//! Available to downstream crates through the `testing` feature.

mod assertions;
mod fixtures;
mod mocks;

pub use assertions::{assert_fell_back, assert_handled_by, assert_markers};
pub use fixtures::{AddTotalsRow, Scale, SelectColumns, Table};
pub use mocks::{
    CountingFallback, CountingStage, FailingStage, ForbiddenHandler, ForbiddenStage, RecordingStage,
};
