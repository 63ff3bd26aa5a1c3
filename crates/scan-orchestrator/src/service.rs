// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The inbound surface (§6): `SubmitScan`, `GetScanStatus`, `GetScanResults`,
//! `CancelScan`, `ListScans`. Thin: validates, then delegates to the queue
//! and persistence adapter, which already own the real state.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use secscan_core::{
    Clock, ConsensusFinding, FindingFilter, JobId, PersistenceAdapter, ScanError, ScanJob, ScanRequest, ScanState,
    ScanStatistics, SystemClock,
};
use secscan_queue::{JobQueue, Progress, QueueStatus};

use crate::cancellation::CancellationRegistry;

/// A job's state plus the queue's best-effort view of its progress.
#[derive(Debug, Clone)]
pub struct ScanStatus {
    pub job: ScanJob,
    pub queue_status: QueueStatus,
    pub progress: Option<Progress>,
}

/// `GetScanResults`' payload: the consensus findings plus derived counts.
#[derive(Debug, Clone)]
pub struct ScanResults {
    pub findings: Vec<ConsensusFinding>,
    pub statistics: ScanStatistics,
}

pub struct ScanService<P: PersistenceAdapter, C: Clock = SystemClock> {
    persistence: Arc<P>,
    queue: Arc<JobQueue<C>>,
    cancellations: Arc<CancellationRegistry>,
    default_scan_timeout: Duration,
}

impl<P: PersistenceAdapter, C: Clock> ScanService<P, C> {
    pub fn new(persistence: Arc<P>, queue: Arc<JobQueue<C>>, cancellations: Arc<CancellationRegistry>, default_scan_timeout: Duration) -> Self {
        Self { persistence, queue, cancellations, default_scan_timeout }
    }

    /// Validates, persists, and enqueues a new scan (§6). Returns the new
    /// job's id; the worker pool picks it up asynchronously. The job's own
    /// `timeout`, falling back to `default_scan_timeout`, is what the queue
    /// derives this job's lease from (§4.3).
    pub async fn submit_scan(&self, request: ScanRequest) -> Result<JobId, ScanError> {
        request.validate()?;
        let job = ScanJob::new(request);
        let id = job.id.clone();
        let priority = job.priority;
        let timeout = job.timeout.unwrap_or(self.default_scan_timeout);
        self.persistence.create_scan_job(job).await?;
        self.queue.enqueue(id.clone(), priority, timeout);
        Ok(id)
    }

    pub async fn get_scan_status(&self, id: &JobId) -> Result<ScanStatus, ScanError> {
        let job = self.persistence.get_scan_job(id).await?;
        let queue_status = self.queue.status(id);
        let progress = self.queue.progress(id);
        Ok(ScanStatus { job, queue_status, progress })
    }

    /// Consensus findings plus `ScanStatistics`, derived fresh from the
    /// persisted consensus findings and agent results rather than cached
    /// (§3: consensus output is never itself the source of truth).
    pub async fn get_scan_results(&self, id: &JobId, filter: FindingFilter) -> Result<ScanResults, ScanError> {
        let findings = self.persistence.list_consensus_findings(id, filter).await?;
        let agent_results = self.persistence.list_agent_results(id).await?;

        let mut by_severity: HashMap<String, usize> = HashMap::new();
        let mut agreement_histogram: HashMap<String, usize> = HashMap::new();
        for f in &findings {
            *by_severity.entry(f.severity.to_string()).or_insert(0) += 1;
            *agreement_histogram.entry(f.agreement_count.to_string()).or_insert(0) += 1;
        }
        let mut by_status: HashMap<String, usize> = HashMap::new();
        for r in &agent_results {
            *by_status.entry(r.status.to_string()).or_insert(0) += 1;
        }

        let statistics = ScanStatistics { total_findings: findings.len(), by_severity, by_status, agreement_histogram };
        Ok(ScanResults { findings, statistics })
    }

    /// Cancels a pre-terminal scan (§4.4). A no-op on an already-terminal
    /// job. A queued job is cancelled immediately; a running job's
    /// [`ScanContext`](secscan_core::ScanContext) is cancelled and the
    /// worker processing it persists the terminal transition itself.
    pub async fn cancel_scan(&self, id: &JobId) -> Result<(), ScanError> {
        let mut job = self.persistence.get_scan_job(id).await?;
        if job.state.is_terminal() {
            return Ok(());
        }

        match job.state {
            ScanState::Queued => {
                job.transition(ScanState::Cancelled)?;
                self.persistence
                    .update_scan_job_state(id, ScanState::Cancelled, Some("cancelled before dispatch".into()))
                    .await?;
            }
            ScanState::Running => {
                self.cancellations.cancel(id);
            }
            ScanState::Completed | ScanState::Failed | ScanState::Cancelled | ScanState::TimedOut => {
                unreachable!("terminal states are handled above")
            }
        }
        Ok(())
    }

    pub async fn list_scans(&self, state: Option<ScanState>, page: usize, page_size: usize) -> Result<Vec<ScanJob>, ScanError> {
        self.persistence.list_scan_jobs(state, page, page_size).await
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
