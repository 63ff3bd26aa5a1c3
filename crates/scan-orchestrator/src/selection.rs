// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent selection (§4.4): explicit names win when present; otherwise every
//! registered agent whose supported languages intersect the job's.

use std::collections::HashSet;
use std::sync::Arc;

use secscan_core::{Agent, AgentRegistry, AgentResult, Clock, ScanJob};

/// The outcome of resolving which agents run for a job.
pub struct Selection {
    /// Agents the fan-out step should invoke.
    pub selected: Vec<Arc<dyn Agent>>,
    /// Requested-but-unregistered names, already shaped as the `AgentResult`
    /// rows the persistence layer expects (§4.4: "ignore any not in the
    /// registry, record as skipped").
    pub skipped: Vec<AgentResult>,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }
}

/// Resolves the agent set for `job` against `registry`.
///
/// Explicit `requested_agents` are honored verbatim (missing ones recorded
/// as skipped); otherwise every agent with a non-empty intersection between
/// `job.languages` and its own `supported_languages` is included. An empty
/// `job.languages` with no explicit request yields an empty selection,
/// which the caller turns into `no_applicable_agent`.
pub fn select_agents<C: Clock>(job: &ScanJob, registry: &AgentRegistry<C>) -> Selection {
    if !job.requested_agents.is_empty() {
        let mut selected = Vec::with_capacity(job.requested_agents.len());
        let mut skipped = Vec::new();
        for name in &job.requested_agents {
            match registry.get(name) {
                Some(agent) => selected.push(agent),
                None => skipped.push(AgentResult::skipped(job.id.clone(), name.clone(), "agent not registered")),
            }
        }
        return Selection { selected, skipped };
    }

    let wanted: HashSet<&str> = job.languages.iter().map(String::as_str).collect();
    let selected = registry
        .list()
        .into_iter()
        .filter(|agent| agent.describe().supported_languages.iter().any(|l| wanted.contains(l.as_str())))
        .collect();
    Selection { selected, skipped: Vec::new() }
}

#[cfg(test)]
#[path = "selection_tests.rs"]
mod tests;
