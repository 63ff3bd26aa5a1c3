// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `secscan agents`: lists the bundled demo agents and their capabilities.

use secscan_core::Agent;
use serde::Serialize;

use crate::agents::PatternAgent;
use crate::output::{handle_list, OutputFormat};

#[derive(Serialize)]
struct AgentRow {
    name: String,
    version: String,
    supported_languages: Vec<String>,
    vulnerability_categories: Vec<String>,
    default_timeout_secs: u64,
}

pub async fn handle(format: OutputFormat) -> anyhow::Result<()> {
    let agents: Vec<Box<dyn Agent>> = vec![Box::new(PatternAgent::secret_scanner()), Box::new(PatternAgent::dangerous_call())];

    let rows: Vec<AgentRow> = agents
        .iter()
        .map(|a| {
            let describe = a.describe();
            AgentRow {
                name: a.name().to_string(),
                version: a.version().version,
                supported_languages: describe.supported_languages,
                vulnerability_categories: describe.vulnerability_categories,
                default_timeout_secs: describe.default_timeout.as_secs(),
            }
        })
        .collect();

    handle_list(format, &rows, "no agents registered", |rows| {
        for row in rows {
            println!("{} (v{})", row.name, row.version);
            println!("  languages: {}", row.supported_languages.join(", "));
            println!("  categories: {}", row.vulnerability_categories.join(", "));
        }
    })
}
