// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-wide configuration.
//!
//! `CoreConfig` covers every core-governing knob. It has sensible defaults
//! and can be overlaid with a TOML file via [`CoreConfig::load`]. No other
//! process-wide mutable state exists — everything else is either
//! per-request or per-agent and threaded explicitly.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::ScanError;

/// Priority-band fairness interleaving counters.
///
/// After `k` consecutive dequeues from `high`, the queue services one from
/// `medium`; after `m` from `medium`, one from `low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorityFairness {
    pub k: u32,
    pub m: u32,
}

impl Default for PriorityFairness {
    fn default() -> Self {
        Self { k: 10, m: 5 }
    }
}

/// Process-wide configuration for the queue, orchestrator, and consensus engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreConfig {
    /// Parallel worker loops.
    pub worker_count: usize,
    /// Global agent-invocation semaphore.
    pub max_concurrent_agents: usize,
    /// Overall scan deadline when the request does not specify one.
    #[serde(with = "humantime_secs")]
    pub default_scan_timeout: Duration,
    /// Per-agent deadline cap.
    #[serde(with = "humantime_secs")]
    pub default_agent_timeout: Duration,
    /// Queue visibility timeout.
    #[serde(with = "humantime_secs")]
    pub lease_duration: Duration,
    /// Dead-letter threshold.
    pub max_attempts: u32,
    /// Retry backoff base wait.
    #[serde(with = "humantime_secs")]
    pub backoff_base: Duration,
    /// Retry backoff max wait.
    #[serde(with = "humantime_secs")]
    pub backoff_max: Duration,
    /// Lease sweep period.
    #[serde(with = "humantime_secs")]
    pub reaper_interval: Duration,
    /// Priority-band interleaving counters.
    pub priority_fairness: PriorityFairness,
    /// Consecutive agent failures before the circuit opens.
    pub circuit_failure_threshold: u32,
    /// Circuit breaker cooldown before a half-open probe.
    #[serde(with = "humantime_secs")]
    pub circuit_cooldown: Duration,
    /// Line number clustering tolerance (± lines).
    pub consensus_line_window: u32,
    /// Token-set title similarity cutoff for clustering.
    pub consensus_title_threshold: f64,
    /// Score uplift applied for clusters of size ≥2 and ≥3.
    pub consensus_multi_tool_bonus: ConsensusBonus,
    /// Agent registry health-check cache TTL.
    #[serde(with = "humantime_secs")]
    pub agent_health_ttl: Duration,
}

/// The two-tier bonus `consensus_multi_tool_bonus` in the config table covers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsensusBonus {
    /// Added for clusters of size ≥2.
    pub agree_two: f64,
    /// Added for clusters of size ≥3 (also promotes severity to cluster max).
    pub agree_three: f64,
}

impl Default for ConsensusBonus {
    fn default() -> Self {
        Self { agree_two: 0.2, agree_three: 0.3 }
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            worker_count: 4,
            max_concurrent_agents: 16,
            default_scan_timeout: Duration::from_secs(600),
            default_agent_timeout: Duration::from_secs(300),
            lease_duration: Duration::from_secs(300),
            max_attempts: 3,
            backoff_base: Duration::from_secs(10),
            backoff_max: Duration::from_secs(600),
            reaper_interval: Duration::from_secs(30),
            priority_fairness: PriorityFairness::default(),
            circuit_failure_threshold: 5,
            circuit_cooldown: Duration::from_secs(60),
            consensus_line_window: 3,
            consensus_title_threshold: 0.8,
            consensus_multi_tool_bonus: ConsensusBonus::default(),
            agent_health_ttl: Duration::from_secs(60),
        }
    }
}

impl CoreConfig {
    /// Loads a config by overlaying a TOML file's fields onto the defaults.
    ///
    /// Missing keys fall back to [`CoreConfig::default`]; unknown keys are
    /// rejected so typos in an operator's config file surface immediately
    /// rather than being silently ignored.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScanError> {
        let text = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ScanError::validation(format!("reading config {}: {e}", path.as_ref().display()))
        })?;
        Self::from_toml_str(&text)
    }

    /// Parses a `CoreConfig` from a TOML string, overlaying the defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ScanError> {
        toml::from_str(text)
            .map_err(|e| ScanError::validation(format!("invalid config: {e}")))
    }

    /// The lease duration derived for a given per-agent scan timeout, per §4.3:
    /// `ScanConfig.timeout × 1.5`.
    pub fn lease_for_timeout(&self, timeout: Duration) -> Duration {
        timeout.mul_f64(1.5)
    }
}

/// Serializes/deserializes a `Duration` as whole seconds, matching the
/// second-granularity the config table's defaults are expressed in.
mod humantime_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        d.as_secs().serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(d)?;
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
