// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Finding and consensus output types.
//!
//! A [`Finding`] is what one agent reported at one location; never mutated
//! after being written. A [`ConsensusFinding`] is derived — recomputable at
//! any time from the raw finding multiset (§3) — and is never itself the
//! source of truth.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Severity of a reported finding, ordered low to high for `max` comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
}

crate::simple_display! {
    Severity {
        Info => "info",
        Low => "low",
        Medium => "medium",
        High => "high",
    }
}

/// A vulnerability category as reported by an agent's `VulnCategory`.
///
/// Carried as an opaque string rather than a closed enum: agents are black
/// boxes (§4.1) and the category vocabulary is theirs to define, not the
/// core's to enumerate.
pub type VulnCategory = String;

/// One security issue reported by one agent at one location. Immutable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub tool: String,
    pub rule_id: String,
    pub severity: Severity,
    pub category: VulnCategory,
    pub title: String,
    pub description: String,
    pub file: String,
    pub line: u32,
    pub column: Option<u32>,
    pub code: Option<String>,
    /// Agent-reported confidence in [0, 1].
    pub confidence: f64,
    pub references: Vec<String>,
}

impl Finding {
    /// The canonicalized file path used for clustering: resolved relative
    /// notation removed, forward slashes, no trailing separator.
    pub fn canonical_file(&self) -> String {
        let normalized = self.file.replace('\\', "/");
        let trimmed = normalized.trim_start_matches("./").trim_end_matches('/');
        trimmed.to_string()
    }
}

/// Historical false-positive rates, keyed by (tool, rule fingerprint).
///
/// Optional sidecar the consensus engine may be given; its persistence shape
/// is not defined by this core (§9 open questions).
#[derive(Debug, Clone, Default)]
pub struct FalsePositiveTable {
    rates: HashMap<(String, String), f64>,
}

impl FalsePositiveTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tool: impl Into<String>, rule_fingerprint: impl Into<String>, rate: f64) {
        self.rates.insert((tool.into(), rule_fingerprint.into()), rate);
    }

    pub fn rate_for(&self, tool: &str, rule_fingerprint: &str) -> Option<f64> {
        self.rates.get(&(tool.to_string(), rule_fingerprint.to_string())).copied()
    }
}

/// A cluster of related findings from possibly multiple agents, with an
/// aggregate score. Derived; regenerated from raw findings; never persisted
/// as the source of truth (§3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusFinding {
    pub tool: String,
    pub rule_id: String,
    pub severity: Severity,
    pub category: VulnCategory,
    pub title: String,
    pub description: String,
    pub file: String,
    pub line: u32,
    pub column: Option<u32>,
    pub code: Option<String>,
    pub confidence: f64,
    pub references: Vec<String>,

    pub consensus_score: f64,
    pub agreement_count: u32,
    pub disagreement_count: u32,
    pub supporting_tools: HashSet<String>,
    pub conflicting_tools: HashSet<String>,
    pub cluster_id: u64,
    /// Set only when a cluster of size 1 exceeds the FP-rate threshold and a
    /// false-positive table was supplied to the engine (§4.6).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub likely_false_positive: Option<bool>,
}

/// Aggregate counts returned alongside `GetScanResults`; derived and
/// recomputable, never persisted separately (§6).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanStatistics {
    pub total_findings: usize,
    /// Keyed by `Severity::to_string()` rather than the enum directly so the
    /// map round-trips cleanly through JSON.
    pub by_severity: HashMap<String, usize>,
    pub by_status: HashMap<String, usize>,
    /// Histogram of `agreement_count` values across all consensus findings,
    /// keyed by the decimal string of the count.
    pub agreement_histogram: HashMap<String, usize>,
}

#[cfg(test)]
#[path = "finding_tests.rs"]
mod tests;
