//! Linked chains: stages that each own the next stage and delegate to it.
//!
//! A linked chain is built from [`Step`]s. Each step decides where its own
//! logic runs relative to the delegate call: before it, after it, around it,
//! or instead of it (short-circuit). Chains are always closed by the
//! [`Identity`](crate::stages::Identity) terminal, so delegation never reaches
//! an undefined next stage.
//!
//! Wiring (`set_next_step`, `append`) takes `&mut self`, so a chain cannot be
//! rewired while it is executing.

mod link;
mod linked_pipeline;

pub use link::{FnStep, Link, StageStep, Step};
pub use linked_pipeline::LinkedPipeline;
