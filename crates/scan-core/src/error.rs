// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The closed error taxonomy shared by every crate in the workspace.
//!
//! Every fallible operation in the queue, orchestrator, and consensus engine
//! returns `Result<T, ScanError>`. Each variant carries its own propagation
//! policy (retry locally, nack, record-and-continue, or surface to the
//! caller) rather than leaving that decision to call sites.

use thiserror::Error;

/// The closed taxonomy of failure kinds the core can produce.
///
/// This is the classification an orchestrator or queue worker switches on
/// to decide whether to retry, skip, or surface a failure. It is distinct
/// from [`ScanError`] itself so that wrapped errors (e.g. an agent's own
/// error type) can still be asked "how should I treat this?" via
/// [`ScanError::kind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad request at submission. Surfaced to the caller; never queued.
    Validation,
    /// Unknown job/finding id. Surfaced to the caller.
    NotFound,
    /// Queue/store hiccup. Retried locally with backoff; never marks a job failed.
    TransientInfra,
    /// Agent returned a retryable error. Nacks the job; retried per policy.
    AgentTransient,
    /// Agent returned an unretryable error. Records `AgentResult{status: failed}`, continues other agents.
    AgentPermanent,
    /// Per-agent deadline elapsed. Records `AgentResult{status: timed_out}`, continues.
    AgentTimeout,
    /// Breaker is open for the agent. Records agent as skipped, continues.
    CircuitOpen,
    /// Overall scan deadline elapsed with zero agents done. Job transitions to `timed_out`.
    ScanTimeout,
    /// Agent selection produced an empty set. Job transitions to `failed` at the submission-run transition.
    NoApplicableAgent,
    /// Consensus pipeline raised an exception. Job transitions to `failed` with the reason preserved.
    ConsensusFailed,
    /// External cancel was received. Job transitions to `cancelled`.
    Cancelled,
}

impl ErrorKind {
    /// Whether this kind is recovered locally without user-visible job failure.
    ///
    /// Everything below `agent_permanent` in §7's table is local; job-level
    /// terminal failures are surfaced via `GetScanStatus`.
    pub fn is_locally_recovered(self) -> bool {
        matches!(
            self,
            ErrorKind::TransientInfra | ErrorKind::AgentTransient | ErrorKind::CircuitOpen
        )
    }

    /// Whether the queue should nack (return to band) rather than dead-letter immediately.
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorKind::TransientInfra | ErrorKind::AgentTransient)
    }
}

crate::simple_display! {
    ErrorKind {
        Validation => "validation",
        NotFound => "not_found",
        TransientInfra => "transient_infra",
        AgentTransient => "agent_transient",
        AgentPermanent => "agent_permanent",
        AgentTimeout => "agent_timeout",
        CircuitOpen => "circuit_open",
        ScanTimeout => "scan_timeout",
        NoApplicableAgent => "no_applicable_agent",
        ConsensusFailed => "consensus_failed",
        Cancelled => "cancelled",
    }
}

/// The error type returned by every fallible operation in the core.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("transient infrastructure error: {0}")]
    TransientInfra(String),

    #[error("agent {agent} returned a transient error: {source}")]
    AgentTransient {
        agent: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("agent {agent} returned a permanent error: {source}")]
    AgentPermanent {
        agent: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("agent {agent} timed out after {elapsed_ms} ms")]
    AgentTimeout { agent: String, elapsed_ms: u64 },

    #[error("circuit open for agent {agent}")]
    CircuitOpen { agent: String },

    #[error("scan {job_id} timed out with zero agents completed")]
    ScanTimeout { job_id: String },

    #[error("no applicable agent for scan {job_id}")]
    NoApplicableAgent { job_id: String },

    #[error("consensus pipeline failed for scan {job_id}: {reason}")]
    ConsensusFailed { job_id: String, reason: String },

    #[error("scan {job_id} was cancelled")]
    Cancelled { job_id: String },
}

impl ScanError {
    /// Classify this error into its taxonomy kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ScanError::Validation(_) => ErrorKind::Validation,
            ScanError::NotFound(_) => ErrorKind::NotFound,
            ScanError::TransientInfra(_) => ErrorKind::TransientInfra,
            ScanError::AgentTransient { .. } => ErrorKind::AgentTransient,
            ScanError::AgentPermanent { .. } => ErrorKind::AgentPermanent,
            ScanError::AgentTimeout { .. } => ErrorKind::AgentTimeout,
            ScanError::CircuitOpen { .. } => ErrorKind::CircuitOpen,
            ScanError::ScanTimeout { .. } => ErrorKind::ScanTimeout,
            ScanError::NoApplicableAgent { .. } => ErrorKind::NoApplicableAgent,
            ScanError::ConsensusFailed { .. } => ErrorKind::ConsensusFailed,
            ScanError::Cancelled { .. } => ErrorKind::Cancelled,
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        ScanError::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        ScanError::NotFound(msg.into())
    }

    pub fn transient_infra(msg: impl Into<String>) -> Self {
        ScanError::TransientInfra(msg.into())
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
