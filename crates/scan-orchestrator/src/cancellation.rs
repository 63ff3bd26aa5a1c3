// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job cancellation registry (§4.4, §9): the single mechanism an external
//! `CancelScan` call uses to reach a running job's [`ScanContext`].
//!
//! Stores context clones rather than raw tokens — `ScanContext` already
//! exposes `cancel()`, so looking one up and calling it is the whole
//! implementation. No second cancellation primitive is introduced.

use std::collections::HashMap;

use parking_lot::Mutex;
use secscan_core::{JobId, ScanContext};

#[derive(Default)]
pub struct CancellationRegistry {
    contexts: Mutex<HashMap<JobId, ScanContext>>,
}

impl CancellationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `ctx` reachable by `job_id` for the duration of its processing.
    pub fn register(&self, job_id: JobId, ctx: ScanContext) {
        self.contexts.lock().insert(job_id, ctx);
    }

    /// Cancels the job's context if it is currently registered. Returns
    /// `false` for an unknown or already-finished job — the caller surfaces
    /// that as `not_found` or treats it as a no-op on an already-terminal job.
    pub fn cancel(&self, job_id: &JobId) -> bool {
        match self.contexts.lock().get(job_id) {
            Some(ctx) => {
                ctx.cancel();
                true
            }
            None => false,
        }
    }

    /// Removes the job once it reaches a terminal state.
    pub fn remove(&self, job_id: &JobId) {
        self.contexts.lock().remove(job_id);
    }

    pub fn contains(&self, job_id: &JobId) -> bool {
        self.contexts.lock().contains_key(job_id)
    }
}

#[cfg(test)]
#[path = "cancellation_tests.rs"]
mod tests;
