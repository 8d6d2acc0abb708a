// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Thin CLI bootstrap over the daemon composition root. Environment/config
//! parsing and logging setup live in `conductor-daemon`; this binary only
//! parses the subcommand and calls into it.

use anyhow::Context;
use clap::{Parser, Subcommand};
use conductor_daemon::{App, Config};
use conductor_orchestrator::DefinitionRegistry;

#[derive(Parser)]
#[command(name = "conductor", version, about = "Coding-assistant control plane")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Runs the daemon in the foreground until interrupted.
    Run,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Run => run().await,
    }
}

async fn run() -> anyhow::Result<()> {
    let _logging_guard = conductor_daemon::init_logging();

    let config = Config::from_env().context("failed to parse configuration from environment")?;
    let state_dir = conductor_daemon::state_dir().context("failed to resolve state directory")?;
    std::fs::create_dir_all(&state_dir).context("failed to create state directory")?;

    let app = App::build_with_fixtures(config, state_dir.join("orchestrator-jobs.json"), DefinitionRegistry::new());
    app.start().await.context("failed to start orchestrator queue")?;

    tracing::info!("conductor daemon running, press ctrl-c to stop");
    tokio::signal::ctrl_c().await.context("failed to listen for shutdown signal")?;
    app.shutdown().await;

    Ok(())
}
