// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Agent Registry (§4.2): process-wide map from agent name to instance.
//!
//! Registration happens during process initialization; afterwards the map
//! is read-only. That freeze is enforced structurally rather than with a
//! runtime flag — callers build the registry behind `&mut self`, then hand
//! out `Arc<AgentRegistry<_>>` for read access, at which point no mutation
//! path exists (§5: "no lock needed after freeze").

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::agent::{Agent, ScanContext};
use crate::clock::{Clock, SystemClock};

/// Process-wide mapping from agent name to agent instance.
pub struct AgentRegistry<C: Clock = SystemClock> {
    agents: HashMap<String, Arc<dyn Agent>>,
    health_cache: Mutex<HashMap<String, (bool, Instant)>>,
    health_ttl: Duration,
    clock: C,
}

impl AgentRegistry<SystemClock> {
    /// Creates an empty registry with the default 60s health cache TTL (§4.2).
    pub fn new() -> Self {
        Self::with_clock(Duration::from_secs(60), SystemClock)
    }
}

impl Default for AgentRegistry<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> AgentRegistry<C> {
    pub fn with_clock(health_ttl: Duration, clock: C) -> Self {
        Self { agents: HashMap::new(), health_cache: Mutex::new(HashMap::new()), health_ttl, clock }
    }

    /// Registers an agent under its own `name()`. Idempotent: a duplicate
    /// name is a no-op and returns `false` unless the caller explicitly
    /// opts into replacement via [`register_replacing`](Self::register_replacing).
    pub fn register(&mut self, agent: Arc<dyn Agent>) -> bool {
        if self.agents.contains_key(agent.name()) {
            return false;
        }
        self.agents.insert(agent.name().to_string(), agent);
        true
    }

    /// Registers an agent, replacing any existing registration under the same name.
    pub fn register_replacing(&mut self, agent: Arc<dyn Agent>) {
        self.agents.insert(agent.name().to_string(), agent);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Agent>> {
        self.agents.get(name).cloned()
    }

    pub fn list(&self) -> Vec<Arc<dyn Agent>> {
        self.agents.values().cloned().collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.agents.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Returns the agent's last known health, performing a fresh
    /// `HealthCheck` only when the cached value is older than the TTL.
    /// An unregistered name is reported unhealthy.
    pub async fn healthy(&self, name: &str) -> bool {
        let Some(agent) = self.get(name) else { return false };
        let now = self.clock.now();

        if let Some((healthy, checked_at)) = self.health_cache.lock().get(name).copied() {
            if now.saturating_duration_since(checked_at) < self.health_ttl {
                return healthy;
            }
        }

        let ctx = ScanContext::root(Duration::from_secs(1));
        let healthy = agent.health_check(ctx).await.is_ok();
        self.health_cache.lock().insert(name.to_string(), (healthy, now));
        healthy
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
