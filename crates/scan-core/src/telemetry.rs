// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Structured logging setup.
//!
//! Every span in the queue, orchestrator, and consensus engine is keyed by
//! `job_id`, `agent_name`, or `worker_id` so a single scan's log lines can be
//! filtered out of a busy process. Library code never calls `println!` —
//! only `tracing`'s macros.

use tracing_subscriber::EnvFilter;

/// Installs a global `tracing` subscriber reading its filter from `RUST_LOG`,
/// defaulting to `info` when unset.
///
/// Safe to call once per process; a second call is a no-op (the underlying
/// `set_global_default` error is swallowed since tests may call this
/// repeatedly within one process).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
