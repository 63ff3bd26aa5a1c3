// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Agent Contract (§4.1): the uniform interface every tool wrapper
//! satisfies, plus the fixed data shapes that cross the boundary.
//!
//! Agents are black boxes — the orchestrator relies only on these four
//! operations and never learns which external tool underlies a given agent.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::error::ScanError;
use crate::finding::Finding;
use crate::scan::JobId;

/// Derived per-agent from a `ScanJob` at dispatch time; immutable (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    pub repo_url: String,
    pub branch: String,
    pub commit: String,
    pub languages: Vec<String>,
    /// Present for incremental scans; absent means "whole tree".
    pub files: Option<Vec<String>>,
    /// Wall-clock budget for this agent's `Scan` call.
    pub timeout: Duration,
    pub options: HashMap<String, String>,
}

/// What `Agent::scan` returns on the happy (or partially-happy) path.
///
/// This is the raw RPC-style response — it carries no job bookkeeping.
/// The orchestrator wraps it into an [`AgentResult`] when persisting.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanResult {
    pub findings: Vec<Finding>,
    pub metadata: HashMap<String, String>,
    /// Canonicalized paths this call actually examined, independent of
    /// whether any finding was reported on them. Drives the consensus
    /// engine's per-tool file-scope check (§4.6).
    pub scanned_files: Vec<String>,
}

/// Static metadata returned by `Agent::describe`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    pub supported_languages: Vec<String>,
    pub vulnerability_categories: Vec<String>,
    pub default_timeout: Duration,
    pub requires_containerization: bool,
    pub max_memory_mb: u64,
    pub max_cpu_millicores: u64,
}

/// Semantic version plus an opaque build identifier, returned by `Agent::version`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    pub version: String,
    pub build: String,
}

/// The status an [`AgentResult`] was recorded with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentResultStatus {
    Completed,
    Failed,
    TimedOut,
    Cancelled,
    /// Not part of the §3 status set proper, but the orchestrator records
    /// circuit-broken and registry-absent agents this way so the row count
    /// invariant (`completed_agents ⊆ requested_agents`) stays auditable.
    Skipped,
}

crate::simple_display! {
    AgentResultStatus {
        Completed => "completed",
        Failed => "failed",
        TimedOut => "timed_out",
        Cancelled => "cancelled",
        Skipped => "skipped",
    }
}

/// One agent's outcome for one job. Created once per agent per job; never
/// updated after write (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResult {
    pub job_id: JobId,
    pub agent_name: String,
    pub status: AgentResultStatus,
    pub findings: Vec<Finding>,
    pub duration: Duration,
    pub error: Option<String>,
    pub metadata: HashMap<String, String>,
    /// Carried from `ScanResult::scanned_files` on a completed scan; empty
    /// for every other status.
    pub scanned_files: Vec<String>,
}

impl AgentResult {
    pub fn skipped(job_id: JobId, agent_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            job_id,
            agent_name: agent_name.into(),
            status: AgentResultStatus::Skipped,
            findings: Vec::new(),
            duration: Duration::ZERO,
            error: Some(reason.into()),
            metadata: HashMap::new(),
            scanned_files: Vec::new(),
        }
    }

    pub fn timed_out(job_id: JobId, agent_name: impl Into<String>, duration: Duration) -> Self {
        Self {
            job_id,
            agent_name: agent_name.into(),
            status: AgentResultStatus::TimedOut,
            findings: Vec::new(),
            duration,
            error: Some("per-agent deadline elapsed".to_string()),
            metadata: HashMap::new(),
            scanned_files: Vec::new(),
        }
    }
}

/// Request-scoped cancellation and deadline, derived from the job context
/// and cancelled on job cancellation, per-agent deadline, or overall scan
/// deadline (§4.4 step 4). A single mechanism for the whole cancellation
/// tree, per §9 — timers are never mixed with ad-hoc flags.
#[derive(Clone)]
pub struct ScanContext {
    token: CancellationToken,
    deadline: Instant,
}

impl ScanContext {
    /// Derives a child context with its own deadline, cancelled when either
    /// the parent is cancelled or the child's own deadline elapses.
    pub fn child(&self, timeout: Duration) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline.min(Instant::now() + timeout),
        }
    }

    pub fn root(timeout: Duration) -> Self {
        Self { token: CancellationToken::new(), deadline: Instant::now() + timeout }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// Resolves once the context is cancelled or its deadline elapses.
    pub async fn cancelled_or_expired(&self) {
        let sleep = tokio::time::sleep_until(self.deadline.into());
        tokio::pin!(sleep);
        tokio::select! {
            _ = self.token.cancelled() => {}
            _ = &mut sleep => {}
        }
    }
}

/// The uniform interface every tool wrapper satisfies (§4.1).
#[async_trait]
pub trait Agent: Send + Sync + 'static {
    /// Must honor cancellation and respect `cfg.timeout`. Never errors on
    /// "normal" findings — only on infrastructure failure. Partial output is
    /// acceptable; on timeout the agent should return what it has with
    /// `status: timed_out` rather than erroring.
    async fn scan(&self, ctx: ScanContext, cfg: ScanConfig) -> Result<ScanResult, ScanError>;

    /// Sub-second; used by registry polling and the circuit breaker.
    async fn health_check(&self, ctx: ScanContext) -> Result<(), ScanError>;

    /// Static metadata: supported languages, vulnerability categories,
    /// default timeout, containerization requirement, resource caps.
    fn describe(&self) -> AgentConfig;

    fn version(&self) -> VersionInfo;

    /// The name this agent is registered under. Used for circuit breaker
    /// keying and `AgentResult::agent_name`.
    fn name(&self) -> &str;
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
