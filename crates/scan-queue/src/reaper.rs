// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background lease reclamation (§4.3, §8 scenario 6): a worker that dies or
//! stalls mid-scan leaves its lease to lapse; the reaper periodically sweeps
//! for lapsed leases and redelivers them.

use std::sync::Arc;
use std::time::Duration;

use secscan_core::{Clock, JobId, SystemClock};

use crate::queue::JobQueue;

/// Runs [`JobQueue::reap`] on a fixed interval until the process exits.
///
/// An owned `tokio::time::interval` loop over a cloned `Arc` handle, logging
/// each cycle's work via `tracing` rather than returning it.
pub fn spawn_reaper<C>(queue: Arc<JobQueue<C>>, interval: Duration) -> tokio::task::JoinHandle<()>
where
    C: Clock + Send + Sync + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let redelivered: Vec<JobId> = queue.reap();
            if !redelivered.is_empty() {
                tracing::warn!(count = redelivered.len(), "reaper redelivered lapsed leases");
            }
        }
    })
}

/// Convenience constructor using the real system clock, matching the shape
/// most callers (the orchestrator binary) actually need.
pub fn spawn_system_reaper(queue: Arc<JobQueue<SystemClock>>, interval: Duration) -> tokio::task::JoinHandle<()> {
    spawn_reaper(queue, interval)
}

#[cfg(test)]
#[path = "reaper_tests.rs"]
mod tests;
