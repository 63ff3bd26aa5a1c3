// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Consensus Engine (§4.6): normalizes raw findings, clusters
//! near-duplicates across tools, and scores each cluster into a
//! `ConsensusFinding`. Pure and in-memory — same input always produces the
//! same output (same cluster ids, same scores), which the orchestrator and
//! its tests rely on for replay.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

mod cluster;
mod normalize;
mod score;

use std::collections::{HashMap, HashSet};

use secscan_core::{ConsensusBonus, ConsensusFinding, FalsePositiveTable, Finding, JobId, ScanError};

pub use normalize::{rule_fingerprint, title_similarity, title_tokens};

/// Tunables a caller pulls from `CoreConfig` (`consensus_line_window`,
/// `consensus_title_threshold`, `consensus_multi_tool_bonus`).
#[derive(Debug, Clone, Copy)]
pub struct ConsensusParams {
    pub line_window: u32,
    pub title_threshold: f64,
    pub bonus: ConsensusBonus,
}

/// One completed tool's scan footprint: the canonicalized files it actually
/// examined and the vulnerability categories it is capable of reporting
/// (§4.6's `disagreement_count`: "tools that scanned the same file and
/// category but did not report here").
#[derive(Debug, Clone, Default)]
pub struct ToolScope {
    pub files: HashSet<String>,
    pub categories: HashSet<String>,
}

/// Sorts findings into the deterministic order clustering requires: by
/// file, then line, then tool name (§4.6, §9: "not cosmetic").
pub fn sorted_for_clustering(mut findings: Vec<Finding>) -> Vec<Finding> {
    findings.sort_by(|a, b| (a.canonical_file(), a.line, &a.tool).cmp(&(b.canonical_file(), b.line, &b.tool)));
    findings
}

/// Runs the full pipeline: sort → cluster → score. `tool_universe` is every
/// distinct tool name that produced a completed `AgentResult` on this scan
/// (§9's resolution of the consensus denominator), independent of whether
/// that tool's findings survive into any cluster. `fp_table` is the
/// optional historical false-positive sidecar (§3); its absence only omits
/// the `likely_false_positive` flag, never changes a score.
///
/// The only failure mode is resource exhaustion on extraordinarily large
/// scans (§4.6), surfaced as `consensus_failed` rather than panicking.
pub fn compute_consensus(
    job_id: &JobId,
    findings: Vec<Finding>,
    tool_scope: &HashMap<String, ToolScope>,
    params: ConsensusParams,
    fp_table: Option<&FalsePositiveTable>,
) -> Result<Vec<ConsensusFinding>, ScanError> {
    const MAX_FINDINGS: usize = 1_000_000;
    if findings.len() > MAX_FINDINGS {
        return Err(ScanError::ConsensusFailed {
            job_id: job_id.to_string(),
            reason: format!("refusing to cluster {} findings (limit {MAX_FINDINGS})", findings.len()),
        });
    }

    let tool_universe: HashSet<String> = tool_scope.keys().cloned().collect();
    let sorted = sorted_for_clustering(findings);
    let clusters = cluster::cluster_findings(sorted, params.line_window, params.title_threshold);

    Ok(clusters
        .into_iter()
        .map(|c| score::score_cluster(c, &tool_universe, tool_scope, params.bonus, fp_table))
        .collect())
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
