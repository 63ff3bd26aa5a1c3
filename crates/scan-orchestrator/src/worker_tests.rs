// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::{StubAgent, StubOutcome};
use secscan_core::{Finding, ScanJob, ScanPriority, ScanRequest, ScanType, Severity};
use secscan_persistence::InMemoryPersistence;
use std::collections::HashMap;

fn finding(tool: &str) -> Finding {
    Finding {
        tool: tool.to_string(),
        rule_id: "rule-1".into(),
        severity: Severity::High,
        category: "sql_injection".into(),
        title: "SQL injection".into(),
        description: "user input reaches a query unsanitized".into(),
        file: "src/db.rs".into(),
        line: 42,
        column: None,
        code: None,
        confidence: 0.9,
        references: vec![],
    }
}

struct Harness {
    worker: Worker<InMemoryPersistence, secscan_core::FakeClock>,
    persistence: Arc<InMemoryPersistence>,
}

fn harness(agents: Vec<Arc<dyn Agent>>) -> Harness {
    let clock = secscan_core::FakeClock::new();
    let config = CoreConfig::default();
    let queue = Arc::new(JobQueue::with_clock(&config, clock.clone()));
    let persistence = Arc::new(InMemoryPersistence::new());
    let mut registry = AgentRegistry::with_clock(Duration::from_secs(60), clock.clone());
    for agent in agents {
        registry.register(agent);
    }
    let breakers = Arc::new(CircuitBreakerRegistry::new(clock.clone(), config.circuit_failure_threshold, config.circuit_cooldown));
    let cancellations = Arc::new(CancellationRegistry::new());
    let semaphore = Arc::new(Semaphore::new(config.max_concurrent_agents));
    let worker = Worker::new(
        "worker-1",
        queue,
        persistence.clone(),
        Arc::new(registry),
        breakers,
        cancellations,
        semaphore,
        config,
        None,
        clock,
    );
    Harness { worker, persistence }
}

async fn submit(persistence: &InMemoryPersistence, requested_agents: Vec<&str>, languages: Vec<&str>, timeout: Option<Duration>) -> JobId {
    let job = ScanJob::new(ScanRequest {
        repo_url: "https://example.com/repo.git".into(),
        branch: "main".into(),
        commit: "abc123".into(),
        scan_type: ScanType::Full,
        priority: ScanPriority::Medium,
        requested_agents: requested_agents.into_iter().map(String::from).collect(),
        languages: languages.into_iter().map(String::from).collect(),
        files: None,
        timeout,
        options: HashMap::new(),
    });
    let id = job.id.clone();
    persistence.create_scan_job(job).await.expect("create_scan_job");
    id
}

#[tokio::test]
async fn all_agents_completing_produces_a_completed_job_with_consensus_findings() {
    let semgrep: Arc<dyn Agent> = Arc::new(StubAgent::new("semgrep", &["javascript"], vec![StubOutcome::Ok(vec![finding("semgrep")])]));
    let eslint: Arc<dyn Agent> = Arc::new(StubAgent::new("eslint-security", &["javascript"], vec![StubOutcome::Ok(vec![finding("eslint-security")])]));
    let h = harness(vec![semgrep, eslint]);
    let job_id = submit(&h.persistence, vec![], vec!["javascript"], None).await;

    h.worker.process(&job_id, 1).await.expect("process");

    let job = h.persistence.get_scan_job(&job_id).await.expect("job");
    assert_eq!(job.state, ScanState::Completed);
    assert_eq!(job.completed_agents.len(), 2, "completed_agents must reflect both agents on the persisted job, not just the worker's local copy");
    assert!(job.completed_agents.contains("semgrep"));
    assert!(job.completed_agents.contains("eslint-security"));

    let consensus = h.persistence.list_consensus_findings(&job_id, Default::default()).await.expect("consensus");
    assert_eq!(consensus.len(), 1, "both agents reported the same location and should cluster into one finding");
    assert_eq!(consensus[0].agreement_count, 2);
}

#[tokio::test]
async fn a_completed_agent_that_scanned_the_file_but_found_nothing_counts_as_disagreeing() {
    let semgrep: Arc<dyn Agent> = Arc::new(StubAgent::new("semgrep", &["javascript"], vec![StubOutcome::Ok(vec![finding("semgrep")])]));
    let eslint: Arc<dyn Agent> = Arc::new(StubAgent::new("eslint-security", &["javascript"], vec![StubOutcome::Ok(vec![finding("eslint-security")])]));
    let bandit: Arc<dyn Agent> = Arc::new(StubAgent::new("bandit", &["javascript"], vec![StubOutcome::Ok(vec![])]));
    let h = harness(vec![semgrep, eslint, bandit]);
    let job_id = submit(&h.persistence, vec![], vec!["javascript"], None).await;

    h.worker.process(&job_id, 1).await.expect("process");

    let consensus = h.persistence.list_consensus_findings(&job_id, Default::default()).await.expect("consensus");
    assert_eq!(consensus.len(), 1);
    assert_eq!(consensus[0].agreement_count, 2);
    assert_eq!(consensus[0].disagreement_count, 1, "bandit scanned src/db.rs and reports sql_injection but found nothing here");
    assert!(consensus[0].conflicting_tools.contains("bandit"));
}

#[tokio::test]
async fn one_agent_failing_does_not_prevent_the_job_from_completing() {
    let semgrep: Arc<dyn Agent> = Arc::new(StubAgent::new("semgrep", &["javascript"], vec![StubOutcome::Ok(vec![finding("semgrep")])]));
    let bandit: Arc<dyn Agent> = Arc::new(StubAgent::new("bandit", &["javascript"], vec![StubOutcome::Err]));
    let h = harness(vec![semgrep, bandit]);
    let job_id = submit(&h.persistence, vec![], vec!["javascript"], None).await;

    h.worker.process(&job_id, 1).await.expect("process");

    let job = h.persistence.get_scan_job(&job_id).await.expect("job");
    assert_eq!(job.state, ScanState::Completed);

    let results = h.persistence.list_agent_results(&job_id).await.expect("results");
    assert_eq!(results.len(), 2);
    assert!(results.iter().any(|r| r.agent_name == "bandit" && r.status == AgentResultStatus::Failed));
}

#[tokio::test]
async fn every_agent_failing_fails_the_job() {
    let bandit: Arc<dyn Agent> = Arc::new(StubAgent::new("bandit", &["python"], vec![StubOutcome::Err]));
    let h = harness(vec![bandit]);
    let job_id = submit(&h.persistence, vec![], vec!["python"], None).await;

    h.worker.process(&job_id, 1).await.expect("process");

    let job = h.persistence.get_scan_job(&job_id).await.expect("job");
    assert_eq!(job.state, ScanState::Failed);
}

#[tokio::test]
async fn no_applicable_agent_fails_the_job_without_invoking_anything() {
    let bandit: Arc<dyn Agent> = Arc::new(StubAgent::new("bandit", &["python"], vec![StubOutcome::Ok(vec![])]));
    let h = harness(vec![bandit]);
    let job_id = submit(&h.persistence, vec![], vec!["javascript"], None).await;

    h.worker.process(&job_id, 1).await.expect("process");

    let job = h.persistence.get_scan_job(&job_id).await.expect("job");
    assert_eq!(job.state, ScanState::Failed);
    assert_eq!(job.error.as_deref(), Some("no_applicable_agent"));
}

#[tokio::test]
async fn unregistered_explicit_agent_is_recorded_as_skipped() {
    let h = harness(vec![]);
    let job_id = submit(&h.persistence, vec!["semgrep"], vec![], None).await;

    h.worker.process(&job_id, 1).await.expect("process");

    let results = h.persistence.list_agent_results(&job_id).await.expect("results");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].status, AgentResultStatus::Skipped);

    let job = h.persistence.get_scan_job(&job_id).await.expect("job");
    assert_eq!(job.state, ScanState::Failed);
}

#[tokio::test]
async fn an_agent_that_outlives_the_overall_deadline_times_out_the_job() {
    let slow: Arc<dyn Agent> = Arc::new(
        StubAgent::new("slow-agent", &["javascript"], vec![StubOutcome::Sleep(Duration::from_millis(200), vec![])])
            .with_timeout(Duration::from_secs(5)),
    );
    let h = harness(vec![slow]);
    let job_id = submit(&h.persistence, vec![], vec!["javascript"], Some(Duration::from_millis(20))).await;

    h.worker.process(&job_id, 1).await.expect("process");

    let job = h.persistence.get_scan_job(&job_id).await.expect("job");
    assert_eq!(job.state, ScanState::TimedOut);

    let results = h.persistence.list_agent_results(&job_id).await.expect("results");
    assert_eq!(results[0].status, AgentResultStatus::TimedOut);
}
