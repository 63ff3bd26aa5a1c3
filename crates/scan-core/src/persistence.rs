// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The persistence contract (§6): the narrow interface the orchestrator
//! uses to record jobs, per-agent results, and findings.
//!
//! This module defines the contract only. The core does not assume a
//! specific store; `secscan-persistence` provides an in-memory reference
//! implementation.

use async_trait::async_trait;

use crate::agent::AgentResult;
use crate::error::ScanError;
use crate::finding::{ConsensusFinding, Finding, Severity};
use crate::scan::{JobId, ScanJob, ScanState};

/// Filter + pagination for `ListFindings` / `GetScanResults`.
#[derive(Debug, Clone, Default)]
pub struct FindingFilter {
    pub severity: Option<Severity>,
    pub status: Option<String>,
    pub file: Option<String>,
    pub page: usize,
    pub page_size: usize,
}

impl FindingFilter {
    pub fn matches(&self, finding: &Finding) -> bool {
        if let Some(severity) = self.severity {
            if finding.severity != severity {
                return false;
            }
        }
        if let Some(file) = &self.file {
            if &finding.canonical_file() != file {
                return false;
            }
        }
        true
    }
}

/// Outbound calls the core makes to record scan state (§6).
///
/// Implementations must offer read-your-writes for a single writer on
/// `job_id`. No cross-job transactional guarantees are required.
#[async_trait]
pub trait PersistenceAdapter: Send + Sync + 'static {
    async fn create_scan_job(&self, job: ScanJob) -> Result<(), ScanError>;

    /// Updates a job's state and optional terminal error. The orchestrator
    /// is the only writer of job state (§3); this does not re-validate the
    /// state machine transition, which is enforced by `ScanJob::transition`
    /// before this is called.
    async fn update_scan_job_state(
        &self,
        id: &JobId,
        state: ScanState,
        error: Option<String>,
    ) -> Result<(), ScanError>;

    /// Idempotent by `(job_id, agent_name)` so a redelivered job's
    /// superseded writes are tolerated (§8 boundary behaviors).
    async fn append_agent_result(&self, job_id: &JobId, result: AgentResult) -> Result<(), ScanError>;

    /// Adds one agent name to the persisted `ScanJob.completed_agents` set.
    /// Called once per agent that reaches `AgentResultStatus::Completed`, so
    /// a reader of `get_scan_job`/`list_scan_jobs` sees the set fill in as
    /// the scan progresses rather than only after the job's terminal write.
    async fn record_completed_agent(&self, job_id: &JobId, agent_name: &str) -> Result<(), ScanError>;

    async fn append_findings(&self, job_id: &JobId, findings: Vec<Finding>) -> Result<(), ScanError>;

    async fn append_consensus_findings(
        &self,
        job_id: &JobId,
        findings: Vec<ConsensusFinding>,
    ) -> Result<(), ScanError>;

    async fn get_scan_job(&self, id: &JobId) -> Result<ScanJob, ScanError>;

    async fn list_findings(&self, job_id: &JobId, filter: FindingFilter) -> Result<Vec<Finding>, ScanError>;

    async fn list_consensus_findings(
        &self,
        job_id: &JobId,
        filter: FindingFilter,
    ) -> Result<Vec<ConsensusFinding>, ScanError>;

    async fn list_agent_results(&self, job_id: &JobId) -> Result<Vec<AgentResult>, ScanError>;

    /// Lists jobs matching an optional state filter, newest first, paginated.
    async fn list_scan_jobs(&self, state: Option<ScanState>, page: usize, page_size: usize) -> Result<Vec<ScanJob>, ScanError>;
}

#[cfg(test)]
#[path = "persistence_tests.rs"]
mod tests;
