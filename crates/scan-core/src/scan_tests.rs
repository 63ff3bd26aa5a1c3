// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn full_request() -> ScanRequest {
    ScanRequest {
        repo_url: "https://example.com/repo.git".into(),
        branch: "main".into(),
        commit: "abc123".into(),
        scan_type: ScanType::Full,
        priority: ScanPriority::High,
        requested_agents: vec![],
        languages: vec!["javascript".into()],
        files: None,
        timeout: None,
        options: HashMap::new(),
    }
}

#[test]
fn validate_rejects_empty_repo_url() {
    let mut req = full_request();
    req.repo_url = "  ".into();
    assert!(req.validate().is_err());
}

#[test]
fn validate_rejects_incremental_without_files() {
    let mut req = full_request();
    req.scan_type = ScanType::Incremental;
    assert!(req.validate().is_err());

    req.files = Some(vec!["src/x.js".into()]);
    assert!(req.validate().is_ok());
}

#[test]
fn validate_accepts_well_formed_full_scan() {
    assert!(full_request().validate().is_ok());
}

#[test]
fn new_job_starts_queued_with_zero_attempts() {
    let job = ScanJob::new(full_request());
    assert_eq!(job.state, ScanState::Queued);
    assert_eq!(job.attempts, 0);
    assert!(job.completed_agents.is_empty());
}

#[test]
fn queued_to_running_increments_attempts_and_sets_started_at() {
    let mut job = ScanJob::new(full_request());
    job.transition(ScanState::Running).unwrap();
    assert_eq!(job.state, ScanState::Running);
    assert_eq!(job.attempts, 1);
    assert!(job.started_at.is_some());
}

#[test]
fn reaper_style_reentry_increments_attempts_again() {
    let mut job = ScanJob::new(full_request());
    job.transition(ScanState::Running).unwrap();
    // The reaper returns the job to queued, then a new worker picks it up.
    job.state = ScanState::Queued;
    job.transition(ScanState::Running).unwrap();
    assert_eq!(job.attempts, 2);
}

#[test]
fn running_to_each_terminal_state_is_legal() {
    for terminal in [ScanState::Completed, ScanState::Failed, ScanState::Cancelled, ScanState::TimedOut] {
        let mut job = ScanJob::new(full_request());
        job.transition(ScanState::Running).unwrap();
        job.transition(terminal).unwrap();
        assert_eq!(job.state, terminal);
        assert!(job.state.is_terminal());
        assert!(job.completed_at.is_some());
    }
}

#[test]
fn terminal_states_are_absorbing() {
    let mut job = ScanJob::new(full_request());
    job.transition(ScanState::Running).unwrap();
    job.transition(ScanState::Completed).unwrap();
    assert!(job.transition(ScanState::Running).is_err());
    assert!(job.transition(ScanState::Failed).is_err());
}

#[test]
fn queued_cannot_skip_directly_to_terminal() {
    let mut job = ScanJob::new(full_request());
    assert!(job.transition(ScanState::Completed).is_err());
}

#[test]
fn fail_with_sets_error_and_transitions() {
    let mut job = ScanJob::new(full_request());
    job.transition(ScanState::Running).unwrap();
    job.fail_with("no_applicable_agent").unwrap();
    assert_eq!(job.state, ScanState::Failed);
    assert_eq!(job.error.as_deref(), Some("no_applicable_agent"));
}

#[test]
fn record_completed_agent_is_idempotent() {
    let mut job = ScanJob::new(full_request());
    job.record_completed_agent("semgrep");
    job.record_completed_agent("semgrep");
    assert_eq!(job.completed_agents.len(), 1);
}

#[test]
fn job_id_has_job_prefix() {
    let job = ScanJob::new(full_request());
    assert!(job.id.as_str().starts_with("job-"));
}
