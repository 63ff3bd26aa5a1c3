// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-agent circuit breaker (§4.4, §5: "process-local, not cluster-global").
//!
//! Counts consecutive failures for one agent. `closed` allows every call;
//! `F` consecutive failures opens the circuit, short-circuiting calls as
//! `skipped` until `cooldown` elapses; then one `half_open` probe is let
//! through, and its outcome closes or reopens the circuit.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use secscan_core::{Clock, SystemClock};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

struct Inner {
    state: CircuitState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    probe_in_flight: bool,
}

/// One agent's breaker. Cheap to construct; state lives behind a single
/// `parking_lot::Mutex` since every operation is a handful of comparisons.
pub struct CircuitBreaker<C: Clock = SystemClock> {
    clock: C,
    failure_threshold: u32,
    cooldown: Duration,
    inner: Mutex<Inner>,
}

impl<C: Clock> CircuitBreaker<C> {
    pub fn with_clock(clock: C, failure_threshold: u32, cooldown: Duration) -> Self {
        Self {
            clock,
            failure_threshold: failure_threshold.max(1),
            cooldown,
            inner: Mutex::new(Inner { state: CircuitState::Closed, consecutive_failures: 0, opened_at: None, probe_in_flight: false }),
        }
    }

    pub fn state(&self) -> CircuitState {
        self.inner.lock().state
    }

    /// Whether a new call should be admitted, transitioning `open` to
    /// `half_open` once `cooldown` has elapsed. Only one probe is admitted
    /// per `half_open` window — concurrent callers racing the same agent
    /// see the others rejected until the probe resolves.
    pub fn try_acquire(&self) -> bool {
        let now = self.clock.now();
        let mut inner = self.inner.lock();
        match inner.state {
            CircuitState::Closed => true,
            CircuitState::Open => {
                let elapsed = inner.opened_at.map(|t| now.saturating_duration_since(t)).unwrap_or(Duration::ZERO);
                if elapsed < self.cooldown {
                    return false;
                }
                inner.state = CircuitState::HalfOpen;
                inner.probe_in_flight = true;
                true
            }
            CircuitState::HalfOpen => {
                if inner.probe_in_flight {
                    false
                } else {
                    inner.probe_in_flight = true;
                    true
                }
            }
        }
    }

    pub fn record_success(&self) {
        let mut inner = self.inner.lock();
        inner.state = CircuitState::Closed;
        inner.consecutive_failures = 0;
        inner.opened_at = None;
        inner.probe_in_flight = false;
    }

    pub fn record_failure(&self) {
        let now = self.clock.now();
        let mut inner = self.inner.lock();
        inner.probe_in_flight = false;
        match inner.state {
            CircuitState::HalfOpen => {
                inner.state = CircuitState::Open;
                inner.opened_at = Some(now);
            }
            CircuitState::Closed | CircuitState::Open => {
                inner.consecutive_failures += 1;
                if inner.consecutive_failures >= self.failure_threshold {
                    inner.state = CircuitState::Open;
                    inner.opened_at = Some(now);
                }
            }
        }
    }
}

/// Process-wide map from agent name to its breaker, created lazily on first
/// use (§4.2's freeze pattern doesn't apply here — breakers are mutable for
/// the life of the process, unlike the registry).
pub struct CircuitBreakerRegistry<C: Clock = SystemClock> {
    clock: C,
    failure_threshold: u32,
    cooldown: Duration,
    breakers: Mutex<HashMap<String, Arc<CircuitBreaker<C>>>>,
}

impl<C: Clock> CircuitBreakerRegistry<C> {
    pub fn new(clock: C, failure_threshold: u32, cooldown: Duration) -> Self {
        Self { clock, failure_threshold, cooldown, breakers: Mutex::new(HashMap::new()) }
    }

    pub fn breaker_for(&self, agent_name: &str) -> Arc<CircuitBreaker<C>> {
        let mut breakers = self.breakers.lock();
        breakers
            .entry(agent_name.to_string())
            .or_insert_with(|| Arc::new(CircuitBreaker::with_clock(self.clock.clone(), self.failure_threshold, self.cooldown)))
            .clone()
    }
}

#[cfg(test)]
#[path = "circuit_tests.rs"]
mod tests;
