// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The per-agent fan-out step (§4.4 steps 1-5): acquire a semaphore permit,
//! check the circuit breaker, derive a per-agent `ScanConfig`, call the
//! agent, and shape the result into an `AgentResult`.

use std::collections::HashMap;
use std::sync::Arc;

use secscan_core::{Agent, AgentResult, AgentResultStatus, Clock, JobId, ScanConfig, ScanContext};
use tokio::sync::Semaphore;

use crate::circuit::CircuitBreaker;

/// Everything about the job that is common across every agent invocation;
/// only `timeout` varies per agent (§4.4 step 3).
#[derive(Clone)]
pub struct ScanConfigTemplate {
    pub repo_url: String,
    pub branch: String,
    pub commit: String,
    pub languages: Vec<String>,
    pub files: Option<Vec<String>>,
    pub options: HashMap<String, String>,
}

impl ScanConfigTemplate {
    fn into_config(self, timeout: std::time::Duration) -> ScanConfig {
        ScanConfig {
            repo_url: self.repo_url,
            branch: self.branch,
            commit: self.commit,
            languages: self.languages,
            files: self.files,
            timeout,
            options: self.options,
        }
    }
}

/// Runs one agent to completion (or timeout/cancellation/circuit-open),
/// always returning an `AgentResult` — never an error, since each row is
/// independently shaped for persistence (§5: "write `AgentResult` rows
/// individually").
pub async fn invoke_agent<C: Clock>(
    job_id: &JobId,
    agent: Arc<dyn Agent>,
    job_ctx: &ScanContext,
    semaphore: Arc<Semaphore>,
    breaker: Arc<CircuitBreaker<C>>,
    template: ScanConfigTemplate,
    clock: &C,
) -> AgentResult {
    let agent_name = agent.name().to_string();

    let permit = tokio::select! {
        biased;
        _ = job_ctx.cancelled_or_expired() => None,
        permit = semaphore.acquire_owned() => permit.ok(),
    };
    let Some(_permit) = permit else {
        return AgentResult::skipped(job_id.clone(), agent_name, "scan cancelled or deadline elapsed before an agent slot was available");
    };

    if !breaker.try_acquire() {
        return AgentResult::skipped(job_id.clone(), agent_name, "circuit_open");
    }

    let describe = agent.describe();
    let timeout = describe.default_timeout.min(job_ctx.remaining());
    let agent_ctx = job_ctx.child(timeout);
    let cfg = template.into_config(timeout);

    let started = clock.now();
    let outcome = tokio::select! {
        biased;
        _ = agent_ctx.cancelled_or_expired() => None,
        result = agent.scan(agent_ctx.clone(), cfg) => Some(result),
    };
    let elapsed = clock.now().saturating_duration_since(started);

    match outcome {
        Some(Ok(scan_result)) => {
            breaker.record_success();
            AgentResult {
                job_id: job_id.clone(),
                agent_name,
                status: AgentResultStatus::Completed,
                findings: scan_result.findings,
                duration: elapsed,
                error: None,
                metadata: scan_result.metadata,
                scanned_files: scan_result.scanned_files,
            }
        }
        Some(Err(err)) => {
            breaker.record_failure();
            AgentResult {
                job_id: job_id.clone(),
                agent_name,
                status: AgentResultStatus::Failed,
                findings: Vec::new(),
                duration: elapsed,
                error: Some(err.to_string()),
                metadata: HashMap::new(),
                scanned_files: Vec::new(),
            }
        }
        None if job_ctx.is_cancelled() => AgentResult {
            job_id: job_id.clone(),
            agent_name,
            status: AgentResultStatus::Cancelled,
            findings: Vec::new(),
            duration: elapsed,
            error: Some("scan cancelled".to_string()),
            metadata: HashMap::new(),
            scanned_files: Vec::new(),
        },
        None => {
            breaker.record_failure();
            AgentResult::timed_out(job_id.clone(), agent_name, elapsed)
        }
    }
}

#[cfg(test)]
#[path = "fanout_tests.rs"]
mod tests;
