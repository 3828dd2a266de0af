//! Aggregating pipelines.
//!
//! This module provides:
//! - The aggregating [`Pipeline`], which always runs every stage in order
//! - Pipeline configuration
//! - The per-thread nesting guard shared with linked pipelines

mod aggregate;
mod config;
pub(crate) mod depth;

pub use aggregate::Pipeline;
pub use config::{PipelineConfig, DEFAULT_MAX_NESTING_DEPTH};
