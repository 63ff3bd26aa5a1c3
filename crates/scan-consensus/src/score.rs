// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cluster scoring (§4.6): `consensus_score` from cluster size over the
//! reporting-tool universe, severity promotion for k≥3, and the
//! single-tool false-positive flag.

use std::collections::{HashMap, HashSet};

use secscan_core::{ConsensusBonus, ConsensusFinding, FalsePositiveTable, Finding, Severity};

use crate::cluster::Cluster;
use crate::ToolScope;

/// Above this historical false-positive rate, a single-tool finding is
/// flagged `likely_false_positive` (§4.6).
const FALSE_POSITIVE_RATE_THRESHOLD: f64 = 0.3;

/// Scores one cluster against `tool_universe` — every distinct tool that
/// reported anything on this scan (§9's resolution of the denominator
/// question) — producing the `ConsensusFinding` the engine emits.
///
/// `disagreement_count` / `conflicting_tools` are exactly the universe
/// tools outside the cluster's supporting set whose `ToolScope` shows the
/// cluster's file and category were in scope for them (§4.6): a tool that
/// never examined this file, or that cannot report this category at all,
/// is silently excluded rather than counted as disagreeing.
pub fn score_cluster(cluster: Cluster, tool_universe: &HashSet<String>, tool_scope: &HashMap<String, ToolScope>, bonus: ConsensusBonus, fp_table: Option<&FalsePositiveTable>) -> ConsensusFinding {
    let Some(anchor) = cluster.members.first().cloned() else {
        unreachable!("clusters always have at least one member")
    };
    let k = cluster.members.len();
    let u = tool_universe.len().max(1) as f64;

    let supporting_tools: HashSet<String> = cluster.members.iter().map(|f| f.tool.clone()).collect();
    let anchor_file = anchor.canonical_file();
    let conflicting_tools: HashSet<String> = tool_universe
        .difference(&supporting_tools)
        .filter(|tool| {
            tool_scope
                .get(*tool)
                .is_some_and(|scope| scope.files.contains(&anchor_file) && scope.categories.contains(&anchor.category))
        })
        .cloned()
        .collect();

    let (consensus_score, severity) = score_and_severity(&cluster.members, &anchor, k, u, bonus);

    let likely_false_positive = if k == 1 {
        fp_table.and_then(|table| table.rate_for(&anchor.tool, &anchor.rule_id)).map(|rate| rate > FALSE_POSITIVE_RATE_THRESHOLD)
    } else {
        None
    };

    ConsensusFinding {
        tool: anchor.tool,
        rule_id: anchor.rule_id,
        severity,
        category: anchor.category,
        title: anchor.title,
        description: anchor.description,
        file: anchor.file,
        line: anchor.line,
        column: anchor.column,
        code: anchor.code,
        confidence: anchor.confidence,
        references: anchor.references,
        consensus_score,
        agreement_count: k as u32,
        disagreement_count: conflicting_tools.len() as u32,
        supporting_tools,
        conflicting_tools,
        cluster_id: cluster.id,
        likely_false_positive,
    }
}

fn score_and_severity(members: &[Finding], anchor: &Finding, k: usize, u: f64, bonus: ConsensusBonus) -> (f64, Severity) {
    match k {
        0 => unreachable!("clusters always have at least one member"),
        1 => (anchor.confidence * 0.5, anchor.severity),
        2 => ((k as f64 / u + bonus.agree_two).min(1.0), anchor.severity),
        _ => {
            let max_severity = members.iter().map(|f| f.severity).max().unwrap_or(anchor.severity);
            ((k as f64 / u + bonus.agree_three).min(1.0), max_severity)
        }
    }
}

#[cfg(test)]
#[path = "score_tests.rs"]
mod tests;
