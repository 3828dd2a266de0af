//! Per-thread re-entry guard shared by every pipeline flavor.
//!
//! Each running pipeline pushes its identity onto a thread-local stack. Only
//! the same instance showing up again counts against its limit, so distinct
//! pipelines nest without bound.

use crate::errors::{StageError, StageResult};
use std::cell::RefCell;

thread_local! {
    static ACTIVE_PIPELINES: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
}

/// Marks one pipeline instance as active on the current thread until dropped.
#[derive(Debug)]
pub(crate) struct NestingGuard {
    _private: (),
}

impl NestingGuard {
    /// Enters pipeline `id`, failing if it is already active `max_depth` times.
    pub(crate) fn enter(id: usize, pipeline: &str, max_depth: usize) -> StageResult<Self> {
        ACTIVE_PIPELINES.with(|active| {
            let mut active = active.borrow_mut();
            let reentries = active.iter().filter(|&&entry| entry == id).count();
            if reentries >= max_depth {
                return Err(StageError::NestingTooDeep {
                    pipeline: pipeline.to_string(),
                    depth: max_depth,
                });
            }
            active.push(id);
            Ok(Self { _private: () })
        })
    }

    /// Returns how many pipelines are active on the current thread.
    pub(crate) fn current_depth() -> usize {
        ACTIVE_PIPELINES.with(|active| active.borrow().len())
    }
}

impl Drop for NestingGuard {
    fn drop(&mut self) {
        ACTIVE_PIPELINES.with(|active| {
            active.borrow_mut().pop();
        });
    }
}
