// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! An in-process reference implementation of `PersistenceAdapter` (§6).
//!
//! A single struct of `HashMap`s guarded by one lock, read and written
//! wholesale per call. This adapter is not meant to survive a process
//! restart — it exists so the orchestrator and consensus engine have
//! something real to write through in tests and the demo binary.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use secscan_core::{
    AgentResult, ConsensusFinding, Finding, FindingFilter, JobId, PersistenceAdapter, ScanError, ScanJob, ScanState,
};

#[derive(Default)]
struct Inner {
    jobs: HashMap<JobId, ScanJob>,
    /// Insertion sequence, oldest first — `list_scan_jobs` reverses this for
    /// "newest first" without needing wall-clock timestamps on `ScanJob`.
    order: Vec<JobId>,
    agent_results: HashMap<JobId, Vec<AgentResult>>,
    findings: HashMap<JobId, Vec<Finding>>,
    consensus_findings: HashMap<JobId, Vec<ConsensusFinding>>,
}

/// `Mutex`-guarded, single-process store satisfying the read-your-writes
/// requirement for a single `job_id` writer (§6). Not a production store.
#[derive(Default)]
pub struct InMemoryPersistence {
    inner: Mutex<Inner>,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PersistenceAdapter for InMemoryPersistence {
    async fn create_scan_job(&self, job: ScanJob) -> Result<(), ScanError> {
        let mut inner = self.inner.lock();
        if !inner.jobs.contains_key(&job.id) {
            inner.order.push(job.id.clone());
        }
        inner.jobs.insert(job.id.clone(), job);
        Ok(())
    }

    async fn update_scan_job_state(&self, id: &JobId, state: ScanState, error: Option<String>) -> Result<(), ScanError> {
        let mut inner = self.inner.lock();
        let job = inner
            .jobs
            .get_mut(id)
            .ok_or_else(|| ScanError::not_found(format!("no scan job {id}")))?;
        job.transition(state)?;
        if error.is_some() {
            job.error = error;
        }
        Ok(())
    }

    async fn append_agent_result(&self, job_id: &JobId, result: AgentResult) -> Result<(), ScanError> {
        let mut inner = self.inner.lock();
        if !inner.jobs.contains_key(job_id) {
            return Err(ScanError::not_found(format!("no scan job {job_id}")));
        }
        let results = inner.agent_results.entry(job_id.clone()).or_default();
        // Idempotent by (job_id, agent_name): a redelivered job's superseded
        // write for the same agent replaces the prior one in place.
        if let Some(existing) = results.iter_mut().find(|r| r.agent_name == result.agent_name) {
            *existing = result;
        } else {
            results.push(result);
        }
        Ok(())
    }

    async fn record_completed_agent(&self, job_id: &JobId, agent_name: &str) -> Result<(), ScanError> {
        let mut inner = self.inner.lock();
        let job = inner
            .jobs
            .get_mut(job_id)
            .ok_or_else(|| ScanError::not_found(format!("no scan job {job_id}")))?;
        job.record_completed_agent(agent_name);
        Ok(())
    }

    async fn append_findings(&self, job_id: &JobId, findings: Vec<Finding>) -> Result<(), ScanError> {
        let mut inner = self.inner.lock();
        if !inner.jobs.contains_key(job_id) {
            return Err(ScanError::not_found(format!("no scan job {job_id}")));
        }
        inner.findings.entry(job_id.clone()).or_default().extend(findings);
        Ok(())
    }

    async fn append_consensus_findings(&self, job_id: &JobId, findings: Vec<ConsensusFinding>) -> Result<(), ScanError> {
        let mut inner = self.inner.lock();
        if !inner.jobs.contains_key(job_id) {
            return Err(ScanError::not_found(format!("no scan job {job_id}")));
        }
        inner.consensus_findings.entry(job_id.clone()).or_default().extend(findings);
        Ok(())
    }

    async fn get_scan_job(&self, id: &JobId) -> Result<ScanJob, ScanError> {
        self.inner
            .lock()
            .jobs
            .get(id)
            .cloned()
            .ok_or_else(|| ScanError::not_found(format!("no scan job {id}")))
    }

    async fn list_findings(&self, job_id: &JobId, filter: FindingFilter) -> Result<Vec<Finding>, ScanError> {
        let inner = self.inner.lock();
        let all = inner.findings.get(job_id).cloned().unwrap_or_default();
        Ok(paginate(all.into_iter().filter(|f| filter.matches(f)).collect(), filter.page, filter.page_size))
    }

    async fn list_consensus_findings(&self, job_id: &JobId, filter: FindingFilter) -> Result<Vec<ConsensusFinding>, ScanError> {
        let inner = self.inner.lock();
        let all = inner.consensus_findings.get(job_id).cloned().unwrap_or_default();
        let filtered: Vec<_> = all
            .into_iter()
            .filter(|cf| filter.severity.map_or(true, |s| cf.severity == s))
            .collect();
        Ok(paginate(filtered, filter.page, filter.page_size))
    }

    async fn list_agent_results(&self, job_id: &JobId) -> Result<Vec<AgentResult>, ScanError> {
        Ok(self.inner.lock().agent_results.get(job_id).cloned().unwrap_or_default())
    }

    async fn list_scan_jobs(&self, state: Option<ScanState>, page: usize, page_size: usize) -> Result<Vec<ScanJob>, ScanError> {
        let inner = self.inner.lock();
        let matching: Vec<ScanJob> = inner
            .order
            .iter()
            .rev()
            .filter_map(|id| inner.jobs.get(id))
            .filter(|job| state.map_or(true, |s| job.state == s))
            .cloned()
            .collect();
        Ok(paginate(matching, page, page_size))
    }
}

fn paginate<T>(items: Vec<T>, page: usize, page_size: usize) -> Vec<T> {
    if page_size == 0 {
        return items;
    }
    items.into_iter().skip(page * page_size).take(page_size).collect()
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
