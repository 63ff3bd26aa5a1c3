// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Job Queue (§4.3): three priority bands, at-least-once delivery via
//! lease + visibility timeout, retry with backoff, and dead-lettering.

use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use secscan_core::{Clock, CoreConfig, JobId, ScanError, ScanPriority, SystemClock};

use crate::band::{FairnessPolicy, FairnessState};
use crate::kv::{LeaseStore, ListStore};
use crate::retry::next_backoff;

#[derive(Debug, Clone)]
struct QueuedEntry {
    job_id: JobId,
    attempt: u32,
    not_before: Instant,
    /// The job's overall scan deadline, carried through retries so a
    /// redelivered job's lease is derived the same way every time.
    timeout: Duration,
}

#[derive(Debug, Clone, Copy)]
struct LeaseMeta {
    priority: ScanPriority,
    attempt: u32,
    timeout: Duration,
}

/// Coarse status a queue reader can observe (§4.3's `Status(job_id)` surface).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueStatus {
    Queued,
    Processing,
    Done,
    Failed,
    /// Never enqueued, or already pruned from every tracked set.
    Unknown,
}

/// Structured progress for a single job (§4.3's `Progress(job_id)` surface).
/// The orchestrator is the source of these fields; the queue only relays
/// whatever was last published via [`JobQueue::publish_progress`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Progress {
    pub phase: String,
    pub completed_agents: usize,
    pub total_agents: usize,
    pub percent: f64,
}

/// Three named FIFO bands with lease-based at-least-once delivery (§4.3).
///
/// These surfaces may be eventually consistent on the order of seconds —
/// `depths()` and `status()` are best-effort reads taken without a global
/// lock across the whole structure.
pub struct JobQueue<C: Clock = SystemClock> {
    lists: ListStore<QueuedEntry>,
    leases: LeaseStore<JobId, LeaseMeta>,
    completed: Mutex<HashSet<JobId>>,
    failed: Mutex<HashSet<JobId>>,
    dead_letter: Mutex<Vec<JobId>>,
    progress: Mutex<HashMap<JobId, Progress>>,
    fairness: Mutex<FairnessState>,
    policy: FairnessPolicy,
    config: CoreConfig,
    max_attempts: u32,
    backoff_base: Duration,
    backoff_max: Duration,
    clock: C,
}

impl JobQueue<SystemClock> {
    pub fn new(config: &CoreConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> JobQueue<C> {
    pub fn with_clock(config: &CoreConfig, clock: C) -> Self {
        Self {
            lists: ListStore::default(),
            leases: LeaseStore::default(),
            completed: Mutex::new(HashSet::new()),
            failed: Mutex::new(HashSet::new()),
            dead_letter: Mutex::new(Vec::new()),
            progress: Mutex::new(HashMap::new()),
            fairness: Mutex::new(FairnessState::default()),
            policy: FairnessPolicy { k: config.priority_fairness.k, m: config.priority_fairness.m },
            config: config.clone(),
            max_attempts: config.max_attempts,
            backoff_base: config.backoff_base,
            backoff_max: config.backoff_max,
            clock,
        }
    }

    /// Appends a job to the tail of its priority band. `timeout` is the
    /// job's overall scan deadline (§4.3) and drives the lease this job is
    /// dequeued under; the queue never assigns a lease shorter than that.
    pub fn enqueue(&self, job_id: JobId, priority: ScanPriority, timeout: Duration) {
        let now = self.clock.now();
        self.lists.push_back(&priority.to_string(), QueuedEntry { job_id, attempt: 0, not_before: now, timeout });
    }

    /// Atomically moves the next eligible job to the processing set under a
    /// fresh lease. Returns `(job_id, attempt)` where `attempt` is 1-indexed.
    pub fn dequeue(&self, worker_id: &str) -> Option<(JobId, u32)> {
        let now = self.clock.now();
        let band = {
            let mut fairness = self.fairness.lock();
            self.policy.pick(
                &mut fairness,
                self.lists.front_is_ready("high", |e| e.not_before <= now),
                self.lists.front_is_ready("medium", |e| e.not_before <= now),
                self.lists.front_is_ready("low", |e| e.not_before <= now),
            )?
        };
        let band_key = band.to_string();
        let entry = self.lists.pop_front_if(&band_key, |e| e.not_before <= now)?;
        let attempt = entry.attempt + 1;
        let lease = self.lease_for(entry.timeout);
        self.leases.insert(entry.job_id.clone(), LeaseMeta { priority: band, attempt, timeout: entry.timeout }, worker_id, now + lease);
        Some((entry.job_id, attempt))
    }

    /// Per §4.3: the lease is always at least the job's overall deadline
    /// times 1.5, floored by the configured default visibility timeout.
    fn lease_for(&self, timeout: Duration) -> Duration {
        self.config.lease_for_timeout(timeout).max(self.config.lease_duration)
    }

    /// Extends a held lease. Fails if the lease already lapsed or is held
    /// by another worker; on failure the worker must abandon the scan.
    pub fn extend(&self, job_id: &JobId, worker_id: &str, extension: Duration) -> Result<(), ScanError> {
        let now = self.clock.now();
        if self.leases.extend(job_id, worker_id, now + extension, now) {
            Ok(())
        } else {
            Err(ScanError::transient_infra(format!(
                "lease extension failed for {job_id}: expired or not held by {worker_id}"
            )))
        }
    }

    /// Removes the job from the processing set. Ack after ack is a no-op.
    pub fn ack(&self, job_id: &JobId, worker_id: &str) {
        if self.leases.remove_if_owned(job_id, worker_id).is_some() {
            self.completed.lock().insert(job_id.clone());
        }
    }

    /// Returns a recoverable failure to its band's tail with an incremented
    /// attempt counter, or dead-letters it once `max_attempts` is reached.
    pub fn nack(&self, job_id: &JobId, worker_id: &str, retry_after: Option<Duration>) {
        let Some(meta) = self.leases.remove_if_owned(job_id, worker_id) else {
            return;
        };
        if meta.attempt >= self.max_attempts {
            self.dead_letter.lock().push(job_id.clone());
            self.failed.lock().insert(job_id.clone());
            return;
        }
        let wait = retry_after.unwrap_or_else(|| next_backoff(meta.attempt, self.backoff_base, self.backoff_max));
        let not_before = self.clock.now() + wait;
        self.lists.push_back(
            &meta.priority.to_string(),
            QueuedEntry { job_id: job_id.clone(), attempt: meta.attempt, not_before, timeout: meta.timeout },
        );
    }

    /// Sweeps the processing set for lapsed leases, incrementing their
    /// attempt and returning them to their band. Idempotent and safe under
    /// concurrent workers — it only ever acts on leases it observes expired.
    /// Returns the job ids it redelivered.
    pub fn reap(&self) -> Vec<JobId> {
        let now = self.clock.now();
        let expired = self.leases.expired(now);
        let mut redelivered = Vec::with_capacity(expired.len());
        for (job_id, meta) in expired {
            if self.leases.remove(&job_id).is_none() {
                continue;
            }
            if meta.attempt >= self.max_attempts {
                self.dead_letter.lock().push(job_id.clone());
                self.failed.lock().insert(job_id.clone());
                continue;
            }
            self.lists.push_front(&meta.priority.to_string(), QueuedEntry { job_id: job_id.clone(), attempt: meta.attempt, not_before: now, timeout: meta.timeout });
            redelivered.push(job_id);
        }
        redelivered
    }

    /// Best-effort coarse status for an external reader.
    pub fn status(&self, job_id: &JobId) -> QueueStatus {
        if self.completed.lock().contains(job_id) {
            return QueueStatus::Done;
        }
        if self.failed.lock().contains(job_id) {
            return QueueStatus::Failed;
        }
        if self.leases.contains(job_id) {
            return QueueStatus::Processing;
        }
        for band in ["high", "medium", "low"] {
            if self.lists.contains(band, |e| &e.job_id == job_id) {
                return QueueStatus::Queued;
            }
        }
        QueueStatus::Unknown
    }

    pub fn publish_progress(&self, job_id: JobId, progress: Progress) {
        self.progress.lock().insert(job_id, progress);
    }

    pub fn progress(&self, job_id: &JobId) -> Option<Progress> {
        self.progress.lock().get(job_id).cloned()
    }

    /// Approximate per-band depths (§4.3).
    pub fn depths(&self) -> HashMap<ScanPriority, usize> {
        HashMap::from([
            (ScanPriority::High, self.lists.len("high")),
            (ScanPriority::Medium, self.lists.len("medium")),
            (ScanPriority::Low, self.lists.len("low")),
        ])
    }

    pub fn processing_count(&self) -> usize {
        self.leases.len()
    }

    pub fn dead_letter_depth(&self) -> usize {
        self.dead_letter.lock().len()
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
