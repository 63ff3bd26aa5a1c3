// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `secscan scan`: submits one job against a local directory, drains it
//! in-process with the bundled demo agents, and prints the terminal status
//! and consensus findings.
//!
//! A single process invocation owns the whole stack end to end — the
//! reference `InMemoryPersistence` does not survive a restart, so there is
//! no separate daemon to submit against across invocations (§9).

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use secscan_core::{AgentRegistry, CoreConfig, ScanPriority, ScanRequest, ScanState, ScanType, SystemClock};
use secscan_orchestrator::{CancellationRegistry, CircuitBreakerRegistry, ScanService, Worker};
use secscan_persistence::InMemoryPersistence;
use secscan_queue::JobQueue;
use tokio::sync::Semaphore;

use crate::agents::PatternAgent;
use crate::exit_error::ExitError;
use crate::output::{format_or_json, OutputFormat};

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum PriorityArg {
    Low,
    Medium,
    High,
}

impl From<PriorityArg> for ScanPriority {
    fn from(p: PriorityArg) -> Self {
        match p {
            PriorityArg::Low => ScanPriority::Low,
            PriorityArg::Medium => ScanPriority::Medium,
            PriorityArg::High => ScanPriority::High,
        }
    }
}

#[derive(Args)]
pub struct ScanArgs {
    /// Local directory to scan with the bundled demo agents.
    path: PathBuf,

    /// Explicit agent names to run; omit to auto-select by --language.
    #[arg(long = "agent")]
    agents: Vec<String>,

    /// Languages the target is written in, used for auto-selection when
    /// --agent is not given. The bundled demo agents all register under the
    /// "text" language.
    #[arg(long = "language", default_values_t = vec!["text".to_string()])]
    languages: Vec<String>,

    #[arg(long, value_enum, default_value_t = PriorityArg::Medium)]
    priority: PriorityArg,

    /// Overall scan deadline, in seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Number of worker loops draining the queue concurrently.
    #[arg(long, default_value_t = 2)]
    workers: usize,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

pub async fn handle(args: ScanArgs) -> anyhow::Result<()> {
    if !args.path.is_dir() {
        return Err(ExitError::new(2, format!("{} is not a directory", args.path.display())).into());
    }

    let config = CoreConfig::default();

    let mut registry = AgentRegistry::new();
    registry.register(Arc::new(PatternAgent::secret_scanner()));
    registry.register(Arc::new(PatternAgent::dangerous_call()));
    let registry = Arc::new(registry);

    let persistence = Arc::new(InMemoryPersistence::new());
    let queue = Arc::new(JobQueue::new(&config));
    let breakers = Arc::new(CircuitBreakerRegistry::new(SystemClock, config.circuit_failure_threshold, config.circuit_cooldown));
    let cancellations = Arc::new(CancellationRegistry::new());
    let semaphore = Arc::new(Semaphore::new(config.max_concurrent_agents));

    let service = ScanService::new(persistence.clone(), queue.clone(), cancellations.clone(), config.default_scan_timeout);

    let mut options = HashMap::new();
    options.insert("local_path".to_string(), args.path.to_string_lossy().to_string());

    let request = ScanRequest {
        repo_url: format!("file://{}", args.path.display()),
        branch: "local".to_string(),
        commit: "working-tree".to_string(),
        scan_type: ScanType::Full,
        priority: args.priority.into(),
        requested_agents: args.agents,
        languages: args.languages,
        files: None,
        timeout: args.timeout_secs.map(Duration::from_secs),
        options,
    };

    let job_id = service.submit_scan(request).await?;

    let worker_count = args.workers.max(1);
    let workers: Vec<_> = (0..worker_count)
        .map(|i| {
            Worker::new(
                format!("worker-{i}"),
                queue.clone(),
                persistence.clone(),
                registry.clone(),
                breakers.clone(),
                cancellations.clone(),
                semaphore.clone(),
                config.clone(),
                None,
                SystemClock,
            )
        })
        .collect();

    loop {
        let status = service.get_scan_status(&job_id).await?;
        if status.job.state.is_terminal() {
            break;
        }
        let mut drained = false;
        for worker in &workers {
            if worker.run_once().await {
                drained = true;
            }
        }
        if !drained {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }

    let status = service.get_scan_status(&job_id).await?;
    let results = service.get_scan_results(&job_id, Default::default()).await?;

    format_or_json(
        args.format,
        &serde_json::json!({
            "job_id": status.job.id.to_string(),
            "state": status.job.state.to_string(),
            "error": status.job.error,
            "findings": results.findings,
            "statistics": results.statistics,
        }),
        || {
            println!("scan {} -> {}", status.job.id, status.job.state);
            if let Some(err) = &status.job.error {
                println!("error: {err}");
            }
            if results.findings.is_empty() {
                println!("no findings");
            } else {
                for f in &results.findings {
                    println!(
                        "[{}] {} ({}:{}) — {} tool(s) agree, score {:.2}",
                        f.severity, f.title, f.file, f.line, f.agreement_count, f.consensus_score
                    );
                }
            }
        },
    )?;

    if status.job.state != ScanState::Completed {
        std::process::exit(1);
    }
    Ok(())
}
