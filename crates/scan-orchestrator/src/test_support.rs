// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test doubles. Not compiled outside `#[cfg(test)]`.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use secscan_core::{Agent, AgentConfig, Finding, ScanConfig, ScanContext, ScanError, ScanResult, VersionInfo};

/// One scripted response for a `StubAgent::scan` call.
#[derive(Clone)]
pub enum StubOutcome {
    Ok(Vec<Finding>),
    Err,
    /// Sleeps before resolving — used to exercise per-agent and overall
    /// deadlines without a real slow process.
    Sleep(Duration, Vec<Finding>),
}

/// A fake `Agent` whose `scan` responses are scripted in advance, one per
/// call; the last scripted outcome repeats once the script is exhausted.
pub struct StubAgent {
    name: String,
    languages: Vec<String>,
    default_timeout: Duration,
    script: Mutex<VecDeque<StubOutcome>>,
}

impl StubAgent {
    pub fn new(name: &str, languages: &[&str], script: Vec<StubOutcome>) -> Self {
        Self {
            name: name.to_string(),
            languages: languages.iter().map(|s| s.to_string()).collect(),
            default_timeout: Duration::from_secs(60),
            script: Mutex::new(script.into()),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }
}

#[async_trait]
impl Agent for StubAgent {
    async fn scan(&self, _ctx: ScanContext, _cfg: ScanConfig) -> Result<ScanResult, ScanError> {
        let outcome = {
            let mut script = self.script.lock();
            if script.len() > 1 {
                script.pop_front()
            } else {
                script.front().cloned()
            }
        };
        match outcome.unwrap_or(StubOutcome::Ok(Vec::new())) {
            StubOutcome::Ok(findings) => Ok(ScanResult { findings, metadata: HashMap::new(), scanned_files: vec!["src/db.rs".into()] }),
            StubOutcome::Err => Err(ScanError::AgentPermanent {
                agent: self.name.clone(),
                source: Box::<dyn std::error::Error + Send + Sync>::from("stub agent failure"),
            }),
            StubOutcome::Sleep(duration, findings) => {
                tokio::time::sleep(duration).await;
                Ok(ScanResult { findings, metadata: HashMap::new(), scanned_files: vec!["src/db.rs".into()] })
            }
        }
    }

    async fn health_check(&self, _ctx: ScanContext) -> Result<(), ScanError> {
        Ok(())
    }

    fn describe(&self) -> AgentConfig {
        AgentConfig {
            supported_languages: self.languages.clone(),
            vulnerability_categories: vec!["sql_injection".into()],
            default_timeout: self.default_timeout,
            requires_containerization: false,
            max_memory_mb: 512,
            max_cpu_millicores: 500,
        }
    }

    fn version(&self) -> VersionInfo {
        VersionInfo { version: "0.0.0".into(), build: "stub".into() }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
