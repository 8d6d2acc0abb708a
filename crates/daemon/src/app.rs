// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The composition root: wires the Snapshot Store, Orchestrator Queue,
//! Agent Events Runtime, and Action Executor into one running process,
//! following the teacher's `Runtime<A, N, C>`-composition pattern
//! generalized to this crate's three core collaborators.
//!
//! A real deployment supplies its own [`RuntimeProfileAdapter`] and
//! [`FactoryRegistry`] (compiled-in extension modules); both are external
//! collaborators per SPEC_FULL.md so this crate defaults to fixtures when
//! none are supplied.

use crate::config::Config;
use conductor_adapters::{ExtensionAuditSink, FixtureRuntimeProfileAdapter, InMemoryAuditSink, RuntimeProfileAdapter};
use conductor_core::SystemClock;
use conductor_events::{AgentEventsRuntime, EnqueueHandle, FactoryRegistry, RuntimeConfig};
use conductor_executor::ActionExecutor;
use conductor_orchestrator::{DefinitionRegistry, OrchestratorQueue, QueueError};
use conductor_storage::SnapshotStore;
use std::path::PathBuf;
use std::sync::Arc;

pub struct App {
    pub config: Config,
    pub queue: OrchestratorQueue<SystemClock>,
    pub events: Arc<AgentEventsRuntime<SystemClock>>,
    pub executor: Arc<ActionExecutor>,
}

impl App {
    /// Builds every collaborator but does not start the scheduler loop or
    /// load extension modules yet — see [`Self::start`].
    pub fn build(
        config: Config,
        snapshot_path: impl Into<PathBuf>,
        definitions: DefinitionRegistry,
        adapter: Arc<dyn RuntimeProfileAdapter>,
        factories: Arc<FactoryRegistry>,
    ) -> Self {
        let store = Arc::new(SnapshotStore::new(snapshot_path));
        let queue =
            OrchestratorQueue::new(Arc::new(definitions), store, adapter.clone(), SystemClock, config.queue.clone());

        let audit: Arc<dyn ExtensionAuditSink> = Arc::new(InMemoryAuditSink::new());
        let enqueue: Arc<dyn EnqueueHandle> = Arc::new(queue.clone());
        let runtime_config = RuntimeConfig {
            roots: config.module_roots.clone(),
            trust_mode: config.trust_mode,
            core_api_version: config.core_api_version.clone(),
            runtime_profile_name: config.runtime_profile_name.clone(),
            runtime_profile_version: config.runtime_profile_version.clone(),
        };
        let events = Arc::new(AgentEventsRuntime::new(runtime_config, factories, audit, enqueue, SystemClock));
        let executor = Arc::new(ActionExecutor::new(adapter, Arc::new(queue.clone()) as Arc<dyn EnqueueHandle>));

        Self { config, queue, events, executor }
    }

    /// Builds against the default fixture adapter and an empty factory
    /// registry. Useful for a standalone process with no in-process
    /// extension modules compiled in.
    pub fn build_with_fixtures(config: Config, snapshot_path: impl Into<PathBuf>, definitions: DefinitionRegistry) -> Self {
        Self::build(config, snapshot_path, definitions, FixtureRuntimeProfileAdapter::new(), Arc::new(FactoryRegistry::new()))
    }

    /// Recovers the job table and starts the scheduler loop, then loads
    /// extension modules. Order matters: the queue must be able to accept
    /// enqueues (from handlers) before modules are loaded.
    pub async fn start(&self) -> Result<(), QueueError> {
        if self.config.queue_enabled {
            self.queue.start().await?;
        }
        let records = self.events.load().await;
        for record in &records {
            if record.outcome != conductor_core::ManifestLoadOutcome::Loaded {
                tracing::warn!(module_dir = %record.module_dir.display(), outcome = ?record.outcome, diagnostics = ?record.diagnostics, "extension module did not load");
            }
        }
        Ok(())
    }

    /// Drains the queue and returns. Call during graceful shutdown.
    pub async fn shutdown(&self) {
        self.queue.drain(self.config.drain_timeout).await;
    }
}

#[cfg(test)]
#[path = "app_tests.rs"]
mod tests;
