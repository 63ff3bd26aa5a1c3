// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ScanJob`, `ScanRequest`, and the scan state machine (§3, §4.5).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::collections::HashSet;
use std::time::Instant;

use crate::error::ScanError;

crate::define_id! {
    /// Unique identifier for a scan job.
    pub struct JobId("job-");
}

/// What kind of scan a request is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanType {
    Full,
    Incremental,
    Ide,
}

crate::simple_display! {
    ScanType {
        Full => "full",
        Incremental => "incremental",
        Ide => "ide",
    }
}

/// Priority band a job is enqueued into (§4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanPriority {
    Low,
    Medium,
    High,
}

crate::simple_display! {
    ScanPriority {
        Low => "low",
        Medium => "medium",
        High => "high",
    }
}

/// States of the `ScanJob` state machine (§4.5).
///
/// `Queued → Running → {Completed | Failed | Cancelled | TimedOut}`.
/// Terminal states are absorbing; a job that needs to run again is a new job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanState {
    Queued,
    Running,
    Completed,
    Failed,
    Cancelled,
    TimedOut,
}

crate::simple_display! {
    ScanState {
        Queued => "queued",
        Running => "running",
        Completed => "completed",
        Failed => "failed",
        Cancelled => "cancelled",
        TimedOut => "timed_out",
    }
}

impl ScanState {
    pub fn is_terminal(self) -> bool {
        matches!(self, ScanState::Completed | ScanState::Failed | ScanState::Cancelled | ScanState::TimedOut)
    }

    /// Whether `next` is a legal transition from `self` per §4.5's table.
    ///
    /// `Queued -> Cancelled` covers a cancel received before a worker ever
    /// dequeues the job (§4.4: cancellation is effective any time before a
    /// terminal state, not only while agents are running).
    fn allows(self, next: ScanState) -> bool {
        matches!(
            (self, next),
            (ScanState::Queued, ScanState::Running | ScanState::Cancelled)
                | (
                    ScanState::Running,
                    ScanState::Completed | ScanState::Failed | ScanState::Cancelled | ScanState::TimedOut
                )
        )
    }
}

/// An inbound request to scan a (repo, branch, commit) triple.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanRequest {
    pub repo_url: String,
    pub branch: String,
    pub commit: String,
    pub scan_type: ScanType,
    pub priority: ScanPriority,
    /// Explicit agent names, or empty for auto-selection (§4.4).
    pub requested_agents: Vec<String>,
    /// Languages present in the revision, used to auto-select agents when
    /// `requested_agents` is empty (§4.4). Repository metadata is out of
    /// scope for this core, so this is the only language signal available.
    pub languages: Vec<String>,
    pub files: Option<Vec<String>>,
    pub timeout: Option<std::time::Duration>,
    pub options: HashMap<String, String>,
}

impl ScanRequest {
    /// Validates the request per §7's `validation` error kind: surfaced to
    /// the caller, never queued.
    pub fn validate(&self) -> Result<(), ScanError> {
        if self.repo_url.trim().is_empty() {
            return Err(ScanError::validation("repo_url must not be empty"));
        }
        if self.branch.trim().is_empty() {
            return Err(ScanError::validation("branch must not be empty"));
        }
        if self.commit.trim().is_empty() {
            return Err(ScanError::validation("commit must not be empty"));
        }
        if self.scan_type == ScanType::Incremental && self.files.as_ref().map_or(true, |f| f.is_empty()) {
            return Err(ScanError::validation("incremental scans require a non-empty files list"));
        }
        Ok(())
    }
}

/// The persisted record of one scan's lifecycle (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanJob {
    pub id: JobId,
    pub repo_url: String,
    pub branch: String,
    pub commit: String,
    pub scan_type: ScanType,
    pub priority: ScanPriority,
    /// Ordered list of agent names, or empty for auto-selection.
    pub requested_agents: Vec<String>,
    pub languages: Vec<String>,
    /// Present for incremental scans; absent means "whole tree" (§3).
    pub files: Option<Vec<String>>,
    /// Freeform per-scan options, threaded into every agent's `ScanConfig`.
    pub options: HashMap<String, String>,
    /// Overall scan deadline requested by the caller; `None` defers to
    /// `CoreConfig::default_scan_timeout` at dispatch time, so this type has
    /// no config dependency of its own.
    pub timeout: Option<std::time::Duration>,
    pub completed_agents: HashSet<String>,
    pub state: ScanState,
    #[serde(skip, default = "Instant::now")]
    pub created_at: Instant,
    #[serde(skip)]
    pub started_at: Option<Instant>,
    #[serde(skip)]
    pub completed_at: Option<Instant>,
    pub error: Option<String>,
    pub attempts: u32,
}

impl ScanJob {
    pub fn new(request: ScanRequest) -> Self {
        Self {
            id: JobId::new(),
            repo_url: request.repo_url,
            branch: request.branch,
            commit: request.commit,
            scan_type: request.scan_type,
            priority: request.priority,
            requested_agents: request.requested_agents,
            languages: request.languages,
            files: request.files,
            options: request.options,
            timeout: request.timeout,
            completed_agents: HashSet::new(),
            state: ScanState::Queued,
            created_at: Instant::now(),
            started_at: None,
            completed_at: None,
            error: None,
            attempts: 0,
        }
    }

    /// Applies a state transition, enforcing §4.5's monotonic ordering.
    /// The `attempts` counter increments on every `queued → running` entry,
    /// including re-entries driven by the reaper or an explicit nack.
    pub fn transition(&mut self, next: ScanState) -> Result<(), ScanError> {
        if !self.state.allows(next) {
            return Err(ScanError::validation(format!(
                "illegal scan state transition: {} -> {}",
                self.state, next
            )));
        }
        if next == ScanState::Running {
            self.attempts += 1;
            self.started_at = Some(Instant::now());
        }
        if next.is_terminal() {
            self.completed_at = Some(Instant::now());
        }
        self.state = next;
        Ok(())
    }

    pub fn fail_with(&mut self, reason: impl Into<String>) -> Result<(), ScanError> {
        self.error = Some(reason.into());
        self.transition(ScanState::Failed)
    }

    /// Records an agent as having produced a terminal `AgentResult` for this
    /// job. `completed_agents ⊆ requested_agents` is maintained by callers
    /// only adding names that were actually selected.
    pub fn record_completed_agent(&mut self, agent_name: impl Into<String>) {
        self.completed_agents.insert(agent_name.into());
    }
}

/// A short-lived exclusive claim by one worker on a dequeued job (§3).
/// Deleted on ack, or redelivered after `visible_at` lapses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeasedJob {
    pub job_id: JobId,
    pub worker_id: String,
    pub visible_at: Instant,
    pub attempt: u32,
}

#[cfg(test)]
#[path = "scan_tests.rs"]
mod tests;
