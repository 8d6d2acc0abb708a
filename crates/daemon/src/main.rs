// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use anyhow::Context;
use conductor_daemon::{App, Config};
use conductor_orchestrator::DefinitionRegistry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _logging_guard = conductor_daemon::init_logging();

    let config = Config::from_env().context("failed to parse configuration from environment")?;
    let state_dir = conductor_daemon::state_dir().context("failed to resolve state directory")?;
    std::fs::create_dir_all(&state_dir).context("failed to create state directory")?;

    tracing::info!(state_dir = %state_dir.display(), "starting conductor-daemon");

    let app = App::build_with_fixtures(config, state_dir.join("orchestrator-jobs.json"), DefinitionRegistry::new());
    app.start().await.context("failed to start orchestrator queue")?;

    tokio::signal::ctrl_c().await.context("failed to listen for shutdown signal")?;
    tracing::info!("shutdown signal received, draining queue");
    app.shutdown().await;

    Ok(())
}
