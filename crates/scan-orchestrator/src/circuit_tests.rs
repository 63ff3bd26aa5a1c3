// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use secscan_core::FakeClock;
use std::time::Duration;

fn breaker() -> CircuitBreaker<FakeClock> {
    CircuitBreaker::with_clock(FakeClock::new(), 3, Duration::from_secs(60))
}

#[test]
fn closed_state_allows_every_call() {
    let b = breaker();
    for _ in 0..10 {
        assert!(b.try_acquire());
        b.record_success();
    }
    assert_eq!(b.state(), CircuitState::Closed);
}

#[test]
fn opens_after_consecutive_failure_threshold() {
    let b = breaker();
    for _ in 0..2 {
        assert!(b.try_acquire());
        b.record_failure();
    }
    assert_eq!(b.state(), CircuitState::Closed, "below threshold still closed");

    assert!(b.try_acquire());
    b.record_failure();
    assert_eq!(b.state(), CircuitState::Open);
}

#[test]
fn open_circuit_rejects_calls_before_cooldown() {
    let clock = FakeClock::new();
    let b = CircuitBreaker::with_clock(clock.clone(), 1, Duration::from_secs(60));
    assert!(b.try_acquire());
    b.record_failure();
    assert_eq!(b.state(), CircuitState::Open);

    clock.advance(Duration::from_secs(30));
    assert!(!b.try_acquire());
}

#[test]
fn half_open_after_cooldown_allows_one_probe() {
    let clock = FakeClock::new();
    let b = CircuitBreaker::with_clock(clock.clone(), 1, Duration::from_secs(60));
    assert!(b.try_acquire());
    b.record_failure();

    clock.advance(Duration::from_secs(61));
    assert!(b.try_acquire(), "cooldown elapsed, probe admitted");
    assert_eq!(b.state(), CircuitState::HalfOpen);
    assert!(!b.try_acquire(), "a second concurrent probe is rejected");
}

#[test]
fn half_open_success_closes_circuit() {
    let clock = FakeClock::new();
    let b = CircuitBreaker::with_clock(clock.clone(), 1, Duration::from_secs(60));
    b.try_acquire();
    b.record_failure();
    clock.advance(Duration::from_secs(61));
    assert!(b.try_acquire());

    b.record_success();
    assert_eq!(b.state(), CircuitState::Closed);
    assert!(b.try_acquire());
}

#[test]
fn half_open_failure_reopens_circuit() {
    let clock = FakeClock::new();
    let b = CircuitBreaker::with_clock(clock.clone(), 1, Duration::from_secs(60));
    b.try_acquire();
    b.record_failure();
    clock.advance(Duration::from_secs(61));
    assert!(b.try_acquire());

    b.record_failure();
    assert_eq!(b.state(), CircuitState::Open);
    clock.advance(Duration::from_secs(1));
    assert!(!b.try_acquire(), "fresh cooldown window started on reopen");
}

#[test]
fn registry_creates_independent_breakers_per_agent() {
    let registry = CircuitBreakerRegistry::new(FakeClock::new(), 1, Duration::from_secs(60));
    let semgrep = registry.breaker_for("semgrep");
    let codeql = registry.breaker_for("codeql");
    semgrep.try_acquire();
    semgrep.record_failure();

    assert_eq!(semgrep.state(), CircuitState::Open);
    assert_eq!(codeql.state(), CircuitState::Closed);
}

#[test]
fn registry_returns_the_same_breaker_for_repeated_lookups() {
    let registry = CircuitBreakerRegistry::new(FakeClock::new(), 1, Duration::from_secs(60));
    let first = registry.breaker_for("semgrep");
    first.try_acquire();
    first.record_failure();

    let second = registry.breaker_for("semgrep");
    assert_eq!(second.state(), CircuitState::Open);
}
