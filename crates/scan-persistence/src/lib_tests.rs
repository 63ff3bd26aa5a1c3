// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use secscan_core::{ScanPriority, ScanRequest, ScanType};
use std::collections::HashMap as StdHashMap;

fn sample_request() -> ScanRequest {
    ScanRequest {
        repo_url: "https://example.com/repo.git".into(),
        branch: "main".into(),
        commit: "abc123".into(),
        scan_type: ScanType::Full,
        priority: ScanPriority::High,
        requested_agents: vec!["semgrep".into()],
        languages: vec!["javascript".into()],
        files: None,
        timeout: None,
        options: StdHashMap::new(),
    }
}

fn sample_finding(file: &str) -> Finding {
    Finding {
        tool: "semgrep".into(),
        rule_id: "rule-1".into(),
        severity: secscan_core::Severity::High,
        category: "sql_injection".into(),
        title: "SQL injection".into(),
        description: "unsanitized query".into(),
        file: file.into(),
        line: 10,
        column: None,
        code: None,
        confidence: 0.9,
        references: Vec::new(),
    }
}

#[tokio::test]
async fn create_and_get_round_trips() {
    let store = InMemoryPersistence::new();
    let job = ScanJob::new(sample_request());
    let job_id = job.id.clone();

    store.create_scan_job(job).await.unwrap();
    let fetched = store.get_scan_job(&job_id).await.unwrap();
    assert_eq!(fetched.id, job_id);
    assert_eq!(fetched.state, ScanState::Queued);
}

#[tokio::test]
async fn get_unknown_job_is_not_found() {
    let store = InMemoryPersistence::new();
    let err = store.get_scan_job(&JobId::new()).await.unwrap_err();
    assert_eq!(err.kind(), secscan_core::ErrorKind::NotFound);
}

#[tokio::test]
async fn update_state_enforces_the_job_state_machine() {
    let store = InMemoryPersistence::new();
    let job = ScanJob::new(sample_request());
    let job_id = job.id.clone();
    store.create_scan_job(job).await.unwrap();

    // Queued -> Completed directly is illegal; must pass through Running.
    assert!(store.update_scan_job_state(&job_id, ScanState::Completed, None).await.is_err());
    store.update_scan_job_state(&job_id, ScanState::Running, None).await.unwrap();
    store.update_scan_job_state(&job_id, ScanState::Completed, None).await.unwrap();

    let job = store.get_scan_job(&job_id).await.unwrap();
    assert_eq!(job.state, ScanState::Completed);
}

#[tokio::test]
async fn append_agent_result_is_idempotent_by_agent_name() {
    let store = InMemoryPersistence::new();
    let job = ScanJob::new(sample_request());
    let job_id = job.id.clone();
    store.create_scan_job(job).await.unwrap();

    let first = AgentResult::skipped(job_id.clone(), "semgrep", "first pass");
    store.append_agent_result(&job_id, first).await.unwrap();
    let second = AgentResult::skipped(job_id.clone(), "semgrep", "redelivered pass");
    store.append_agent_result(&job_id, second).await.unwrap();

    let results = store.list_agent_results(&job_id).await.unwrap();
    assert_eq!(results.len(), 1, "redelivery must replace, not duplicate");
    assert_eq!(results[0].error.as_deref(), Some("redelivered pass"));
}

#[tokio::test]
async fn record_completed_agent_accumulates_on_the_persisted_job() {
    let store = InMemoryPersistence::new();
    let job = ScanJob::new(sample_request());
    let job_id = job.id.clone();
    store.create_scan_job(job).await.unwrap();

    store.record_completed_agent(&job_id, "semgrep").await.unwrap();
    store.record_completed_agent(&job_id, "bandit").await.unwrap();
    store.record_completed_agent(&job_id, "semgrep").await.unwrap();

    let fetched = store.get_scan_job(&job_id).await.unwrap();
    assert_eq!(fetched.completed_agents.len(), 2);
    assert!(fetched.completed_agents.contains("semgrep"));
    assert!(fetched.completed_agents.contains("bandit"));
}

#[tokio::test]
async fn record_completed_agent_against_unknown_job_is_not_found() {
    let store = InMemoryPersistence::new();
    let err = store.record_completed_agent(&JobId::new(), "semgrep").await.unwrap_err();
    assert_eq!(err.kind(), secscan_core::ErrorKind::NotFound);
}

#[tokio::test]
async fn findings_filter_by_severity() {
    let store = InMemoryPersistence::new();
    let job = ScanJob::new(sample_request());
    let job_id = job.id.clone();
    store.create_scan_job(job).await.unwrap();

    let mut low = sample_finding("src/main.rs");
    low.severity = secscan_core::Severity::Low;
    store.append_findings(&job_id, vec![sample_finding("src/a.rs"), low]).await.unwrap();

    let filter = FindingFilter { severity: Some(secscan_core::Severity::High), ..Default::default() };
    let high_only = store.list_findings(&job_id, filter).await.unwrap();
    assert_eq!(high_only.len(), 1);
    assert_eq!(high_only[0].file, "src/a.rs");
}

#[tokio::test]
async fn list_scan_jobs_is_newest_first_and_paginated() {
    let store = InMemoryPersistence::new();
    let mut ids = Vec::new();
    for _ in 0..3 {
        let job = ScanJob::new(sample_request());
        ids.push(job.id.clone());
        store.create_scan_job(job).await.unwrap();
    }

    let page = store.list_scan_jobs(None, 0, 2).await.unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page[0].id, ids[2], "newest job created must come first");
    assert_eq!(page[1].id, ids[1]);
}

#[tokio::test]
async fn list_scan_jobs_filters_by_state() {
    let store = InMemoryPersistence::new();
    let job_a = ScanJob::new(sample_request());
    let job_a_id = job_a.id.clone();
    store.create_scan_job(job_a).await.unwrap();
    let job_b = ScanJob::new(sample_request());
    store.create_scan_job(job_b).await.unwrap();

    store.update_scan_job_state(&job_a_id, ScanState::Running, None).await.unwrap();

    let running = store.list_scan_jobs(Some(ScanState::Running), 0, 10).await.unwrap();
    assert_eq!(running.len(), 1);
    assert_eq!(running[0].id, job_a_id);
}

#[tokio::test]
async fn writes_against_unknown_job_are_rejected() {
    let store = InMemoryPersistence::new();
    let job_id = JobId::new();
    let err = store.append_findings(&job_id, vec![sample_finding("src/a.rs")]).await.unwrap_err();
    assert_eq!(err.kind(), secscan_core::ErrorKind::NotFound);
}
