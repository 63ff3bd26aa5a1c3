// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Exponential backoff with jitter (§4.3).
//!
//! `wait = min(base × 2^(attempt-1) + uniform(0, base), max_wait)`. Jitter
//! prevents synchronized retry storms when many jobs fail at once.

use rand::Rng;
use std::time::Duration;

/// Computes the retry wait for `attempt` (1-indexed: the attempt that just
/// failed), using the caller-supplied jitter source so tests can inject a
/// deterministic one.
pub fn backoff_wait(attempt: u32, base: Duration, max_wait: Duration, jitter: impl FnOnce(Duration) -> Duration) -> Duration {
    let exp = attempt.saturating_sub(1).min(32);
    let scaled = base.checked_mul(1u32.checked_shl(exp).unwrap_or(u32::MAX)).unwrap_or(max_wait);
    let with_jitter = scaled.saturating_add(jitter(base));
    with_jitter.min(max_wait)
}

/// Draws a uniform `[0, base)` jitter sample using the thread-local RNG.
pub fn random_jitter(base: Duration) -> Duration {
    if base.is_zero() {
        return Duration::ZERO;
    }
    let millis = base.as_millis().max(1) as u64;
    let sample = rand::thread_rng().gen_range(0..millis);
    Duration::from_millis(sample)
}

/// Computes the next retry wait using the process RNG for jitter.
pub fn next_backoff(attempt: u32, base: Duration, max_wait: Duration) -> Duration {
    backoff_wait(attempt, base, max_wait, random_jitter)
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
