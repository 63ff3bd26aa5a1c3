// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The worker pool (§4.4, §4.5): dequeue → run one job's agents and
//! consensus to a terminal state → ack/nack.
//!
//! A struct generic over its adapters, holding `Arc` handles to shared
//! collaborators, with a `run` loop that owns no state of its own beyond
//! what those collaborators already guard.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use secscan_core::{
    Agent, AgentRegistry, AgentResultStatus, Clock, CoreConfig, FalsePositiveTable, JobId, PersistenceAdapter,
    ScanContext, ScanError, ScanState, SystemClock,
};
use secscan_consensus::{compute_consensus, ConsensusParams, ToolScope};
use secscan_queue::{JobQueue, Progress};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::cancellation::CancellationRegistry;
use crate::circuit::CircuitBreakerRegistry;
use crate::fanout::{invoke_agent, ScanConfigTemplate};
use crate::selection::select_agents;

/// Everything one worker loop needs, shared across the whole pool.
pub struct Worker<P: PersistenceAdapter, C: Clock = SystemClock> {
    pub id: String,
    queue: Arc<JobQueue<C>>,
    persistence: Arc<P>,
    registry: Arc<AgentRegistry<C>>,
    breakers: Arc<CircuitBreakerRegistry<C>>,
    cancellations: Arc<CancellationRegistry>,
    semaphore: Arc<Semaphore>,
    config: CoreConfig,
    fp_table: Option<Arc<FalsePositiveTable>>,
    clock: C,
}

impl<P: PersistenceAdapter, C: Clock> Worker<P, C> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: impl Into<String>,
        queue: Arc<JobQueue<C>>,
        persistence: Arc<P>,
        registry: Arc<AgentRegistry<C>>,
        breakers: Arc<CircuitBreakerRegistry<C>>,
        cancellations: Arc<CancellationRegistry>,
        semaphore: Arc<Semaphore>,
        config: CoreConfig,
        fp_table: Option<Arc<FalsePositiveTable>>,
        clock: C,
    ) -> Self {
        Self { id: id.into(), queue, persistence, registry, breakers, cancellations, semaphore, config, fp_table, clock }
    }

    /// Drains the queue until `shutdown` is cancelled. Empty dequeues back
    /// off briefly rather than busy-spinning.
    pub async fn run(&self, shutdown: CancellationToken) {
        loop {
            if shutdown.is_cancelled() {
                return;
            }
            if !self.run_once().await {
                tokio::select! {
                    _ = shutdown.cancelled() => return,
                    _ = tokio::time::sleep(Duration::from_millis(200)) => {}
                }
            }
        }
    }

    /// Dequeues and drives at most one job to a terminal state. Returns
    /// `false` if the queue had nothing to hand out. Exposed so a one-shot
    /// caller (the demo binary, tests) can drain a known-finite backlog
    /// without standing up the `shutdown`-driven loop in [`Worker::run`].
    pub async fn run_once(&self) -> bool {
        let Some((job_id, attempt)) = self.queue.dequeue(&self.id) else {
            return false;
        };
        if let Err(err) = self.process(&job_id, attempt).await {
            tracing::warn!(job_id = %job_id, kind = %err.kind(), error = %err, "job processing raised an error, nacking");
            self.queue.nack(&job_id, &self.id, None);
        } else {
            self.queue.ack(&job_id, &self.id);
        }
        true
    }

    /// Drives one job from `running` to a terminal state (§4.5). `Ok(())`
    /// means the job reached a persisted terminal state and the caller
    /// should ack; `Err` means an infrastructure hiccup occurred before that
    /// point and the caller should nack for redelivery.
    async fn process(&self, job_id: &JobId, _attempt: u32) -> Result<(), ScanError> {
        let mut job = self.persistence.get_scan_job(job_id).await?;
        job.transition(ScanState::Running)?;
        self.persistence.update_scan_job_state(job_id, ScanState::Running, None).await?;
        self.queue.publish_progress(job_id.clone(), Progress { phase: "preparing".into(), completed_agents: 0, total_agents: 0, percent: 0.0 });

        let selection = select_agents(&job, &self.registry);
        for skipped in selection.skipped {
            self.persistence.append_agent_result(job_id, skipped).await?;
        }

        if selection.selected.is_empty() {
            job.fail_with("no_applicable_agent")?;
            self.persistence.update_scan_job_state(job_id, ScanState::Failed, Some("no_applicable_agent".into())).await?;
            return Ok(());
        }

        let overall_timeout = job.timeout.unwrap_or(self.config.default_scan_timeout);
        let job_ctx = ScanContext::root(overall_timeout);
        self.cancellations.register(job_id.clone(), job_ctx.clone());

        let total_agents = selection.selected.len();
        self.queue.publish_progress(job_id.clone(), Progress { phase: "scanning".into(), completed_agents: 0, total_agents, percent: 0.0 });

        let template = ScanConfigTemplate {
            repo_url: job.repo_url.clone(),
            branch: job.branch.clone(),
            commit: job.commit.clone(),
            languages: job.languages.clone(),
            files: job.files.clone(),
            options: job.options.clone(),
        };

        let handles: Vec<_> = selection
            .selected
            .iter()
            .cloned()
            .map(|agent: Arc<dyn Agent>| {
                let job_ctx = job_ctx.clone();
                let semaphore = self.semaphore.clone();
                let breaker = self.breakers.breaker_for(agent.name());
                let template = template.clone();
                let clock = self.clock.clone();
                let job_id = job_id.clone();
                tokio::spawn(async move { invoke_agent(&job_id, agent, &job_ctx, semaphore, breaker, template, &clock).await })
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.await {
                Ok(result) => results.push(result),
                Err(join_err) => {
                    tracing::error!(job_id = %job_id, error = %join_err, "agent invocation task panicked");
                }
            }
        }
        self.cancellations.remove(job_id);

        let mut completed_findings = Vec::new();
        let mut tool_scope: HashMap<String, ToolScope> = HashMap::new();
        let mut completed_count = 0usize;
        for result in &results {
            self.persistence.append_agent_result(job_id, result.clone()).await?;
            if result.status == AgentResultStatus::Completed {
                completed_count += 1;
                job.record_completed_agent(result.agent_name.clone());
                self.persistence.record_completed_agent(job_id, &result.agent_name).await?;
                let categories = self
                    .registry
                    .get(&result.agent_name)
                    .map(|agent| agent.describe().vulnerability_categories.into_iter().collect())
                    .unwrap_or_default();
                tool_scope.insert(result.agent_name.clone(), ToolScope { files: result.scanned_files.iter().cloned().collect(), categories });
                completed_findings.extend(result.findings.clone());
            }
        }
        if !completed_findings.is_empty() {
            self.persistence.append_findings(job_id, completed_findings.clone()).await?;
        }

        self.queue.publish_progress(
            job_id.clone(),
            Progress { phase: "finalizing".into(), completed_agents: completed_count, total_agents, percent: if total_agents == 0 { 100.0 } else { (completed_count as f64 / total_agents as f64) * 100.0 } },
        );

        if job_ctx.is_cancelled() {
            job.transition(ScanState::Cancelled)?;
            self.persistence.update_scan_job_state(job_id, ScanState::Cancelled, Some("external cancel received".into())).await?;
            return Ok(());
        }

        if completed_count == 0 {
            if job_ctx.remaining() == Duration::ZERO {
                job.error = Some("scan timed out with zero agents completed".to_string());
                job.transition(ScanState::TimedOut)?;
                self.persistence
                    .update_scan_job_state(job_id, ScanState::TimedOut, job.error.clone())
                    .await?;
            } else {
                job.fail_with("every selected agent failed")?;
                self.persistence
                    .update_scan_job_state(job_id, ScanState::Failed, Some("every selected agent failed".into()))
                    .await?;
            }
            return Ok(());
        }

        let params = ConsensusParams {
            line_window: self.config.consensus_line_window,
            title_threshold: self.config.consensus_title_threshold,
            bonus: self.config.consensus_multi_tool_bonus,
        };
        match compute_consensus(job_id, completed_findings, &tool_scope, params, self.fp_table.as_deref()) {
            Ok(consensus_findings) => {
                self.persistence.append_consensus_findings(job_id, consensus_findings).await?;
                job.transition(ScanState::Completed)?;
                self.persistence.update_scan_job_state(job_id, ScanState::Completed, None).await?;
            }
            Err(err) => {
                job.fail_with(err.to_string())?;
                self.persistence.update_scan_job_state(job_id, ScanState::Failed, Some(err.to_string())).await?;
            }
        }

        self.queue.publish_progress(job_id.clone(), Progress { phase: "done".into(), completed_agents: completed_count, total_agents, percent: 100.0 });
        Ok(())
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
