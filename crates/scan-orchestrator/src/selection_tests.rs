// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::StubAgent;
use secscan_core::{ScanPriority, ScanRequest, ScanType};
use std::collections::HashMap;

fn registry_with(agents: Vec<Arc<dyn Agent>>) -> AgentRegistry {
    let mut registry = AgentRegistry::new();
    for agent in agents {
        registry.register(agent);
    }
    registry
}

fn job(requested_agents: Vec<&str>, languages: Vec<&str>) -> ScanJob {
    ScanJob::new(ScanRequest {
        repo_url: "https://example.com/repo.git".into(),
        branch: "main".into(),
        commit: "abc123".into(),
        scan_type: ScanType::Full,
        priority: ScanPriority::Medium,
        requested_agents: requested_agents.into_iter().map(String::from).collect(),
        languages: languages.into_iter().map(String::from).collect(),
        files: None,
        timeout: None,
        options: HashMap::new(),
    })
}

#[test]
fn explicit_agent_names_are_honored_verbatim() {
    let semgrep: Arc<dyn Agent> = Arc::new(StubAgent::new("semgrep", &["javascript"], vec![]));
    let codeql: Arc<dyn Agent> = Arc::new(StubAgent::new("codeql", &["java"], vec![]));
    let registry = registry_with(vec![semgrep, codeql]);

    let job = job(vec!["semgrep"], vec![]);
    let selection = select_agents(&job, &registry);
    assert_eq!(selection.selected.len(), 1);
    assert_eq!(selection.selected[0].name(), "semgrep");
    assert!(selection.skipped.is_empty());
}

#[test]
fn unregistered_explicit_names_are_recorded_as_skipped() {
    let registry = registry_with(vec![]);
    let job = job(vec!["semgrep", "codeql"], vec![]);
    let selection = select_agents(&job, &registry);
    assert!(selection.is_empty());
    assert_eq!(selection.skipped.len(), 2);
    assert!(selection.skipped.iter().all(|r| r.error.as_deref() == Some("agent not registered")));
}

#[test]
fn auto_selection_includes_every_agent_with_matching_language() {
    let semgrep: Arc<dyn Agent> = Arc::new(StubAgent::new("semgrep", &["javascript", "typescript"], vec![]));
    let bandit: Arc<dyn Agent> = Arc::new(StubAgent::new("bandit", &["python"], vec![]));
    let registry = registry_with(vec![semgrep, bandit]);

    let job = job(vec![], vec!["javascript"]);
    let selection = select_agents(&job, &registry);
    assert_eq!(selection.selected.len(), 1);
    assert_eq!(selection.selected[0].name(), "semgrep");
}

#[test]
fn auto_selection_with_no_language_overlap_is_empty() {
    let bandit: Arc<dyn Agent> = Arc::new(StubAgent::new("bandit", &["python"], vec![]));
    let registry = registry_with(vec![bandit]);

    let job = job(vec![], vec!["javascript"]);
    let selection = select_agents(&job, &registry);
    assert!(selection.is_empty());
    assert!(selection.skipped.is_empty(), "auto-selection never produces skip rows");
}

#[test]
fn auto_selection_can_select_multiple_agents_for_one_language() {
    let semgrep: Arc<dyn Agent> = Arc::new(StubAgent::new("semgrep", &["javascript"], vec![]));
    let eslint_security: Arc<dyn Agent> = Arc::new(StubAgent::new("eslint-security", &["javascript"], vec![]));
    let registry = registry_with(vec![semgrep, eslint_security]);

    let job = job(vec![], vec!["javascript"]);
    let selection = select_agents(&job, &registry);
    assert_eq!(selection.selected.len(), 2);
}
