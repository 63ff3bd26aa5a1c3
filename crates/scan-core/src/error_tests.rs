// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn kind_round_trips_through_display() {
    assert_eq!(ErrorKind::NoApplicableAgent.to_string(), "no_applicable_agent");
    assert_eq!(ErrorKind::ConsensusFailed.to_string(), "consensus_failed");
}

#[test]
fn transient_kinds_are_retryable() {
    assert!(ErrorKind::TransientInfra.is_retryable());
    assert!(ErrorKind::AgentTransient.is_retryable());
    assert!(!ErrorKind::AgentPermanent.is_retryable());
    assert!(!ErrorKind::Validation.is_retryable());
}

#[test]
fn locally_recovered_excludes_job_terminal_kinds() {
    assert!(ErrorKind::CircuitOpen.is_locally_recovered());
    assert!(!ErrorKind::ScanTimeout.is_locally_recovered());
    assert!(!ErrorKind::NoApplicableAgent.is_locally_recovered());
    assert!(!ErrorKind::ConsensusFailed.is_locally_recovered());
}

#[test]
fn scan_error_kind_matches_variant() {
    let err = ScanError::NoApplicableAgent { job_id: "job-1".into() };
    assert_eq!(err.kind(), ErrorKind::NoApplicableAgent);

    let err = ScanError::AgentTimeout { agent: "semgrep".into(), elapsed_ms: 60_000 };
    assert_eq!(err.kind(), ErrorKind::AgentTimeout);
}

#[test]
fn validation_helper_builds_expected_variant() {
    let err = ScanError::validation("missing repo_url");
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(err.to_string(), "validation failed: missing repo_url");
}
