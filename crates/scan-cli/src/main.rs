// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Demo entry point: wires the job queue, agent registry, persistence
//! adapter, orchestrator, and consensus engine into one runnable process
//! and drives a scan end to end against a local directory.

mod agents;
mod commands;
mod exit_error;
mod output;

use clap::{Parser, Subcommand};

use exit_error::ExitError;
use output::OutputFormat;

#[derive(Parser)]
#[command(name = "secscan", version, about = "Security scan orchestration demo")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan a local directory with the bundled demo agents.
    Scan(commands::scan::ScanArgs),
    /// List the bundled demo agents and their capabilities.
    Agents {
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

#[tokio::main]
async fn main() {
    secscan_core::init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Scan(args) => commands::scan::handle(args).await,
        Command::Agents { format } => commands::agents::handle(format).await,
    };

    if let Err(err) = result {
        if let Some(exit_err) = err.downcast_ref::<ExitError>() {
            eprintln!("{}", exit_err.message);
            std::process::exit(exit_err.code);
        }
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
