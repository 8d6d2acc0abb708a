// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The composition point: `Load`, `Emit`, `Reload`, `ListLoadedModules`,
//! `SnapshotInfo`. Holds the active snapshot behind a read-copy-update
//! pointer so in-flight emits keep dispatching against the generation they
//! started on even if a reload swaps in a new one mid-flight.

use crate::build::{build_snapshot, BuildContext};
use crate::discovery::{discover_candidates, ModuleRoot};
use crate::error::RuntimeError;
use crate::model::{ActionExecutorHandle, EnqueueHandle};
use crate::registry::FactoryRegistry;
use crate::snapshot::{BoundHandler, ModuleSnapshot};
use chrono::{DateTime, TimeZone, Utc};
use conductor_adapters::ExtensionAuditSink;
use conductor_core::{
    ActionResult, ActionResultDetails, ActionStatus, Clock, DispatchResult, EventEnvelope, HandlerOutput, Job, JobSummary,
    ManifestLoadOutcome, ManifestLoadRecord, ModuleRecord, SnapshotVersion, SystemClock, TrustMode,
};
use conductor_orchestrator::EnqueueInput;
use parking_lot::Mutex;
use semver::Version;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub struct RuntimeConfig {
    pub roots: Vec<ModuleRoot>,
    pub trust_mode: TrustMode,
    pub core_api_version: Version,
    pub runtime_profile_name: String,
    pub runtime_profile_version: Version,
}

pub struct AgentEventsRuntime<C: Clock = SystemClock> {
    config: RuntimeConfig,
    factories: Arc<FactoryRegistry>,
    audit: Arc<dyn ExtensionAuditSink>,
    enqueue: Arc<dyn EnqueueHandle>,
    snapshot: Mutex<Arc<ModuleSnapshot>>,
    reload_lock: tokio::sync::Mutex<()>,
    loaded: AtomicBool,
    clock: C,
}

impl<C: Clock> AgentEventsRuntime<C> {
    pub fn new(
        config: RuntimeConfig,
        factories: Arc<FactoryRegistry>,
        audit: Arc<dyn ExtensionAuditSink>,
        enqueue: Arc<dyn EnqueueHandle>,
        clock: C,
    ) -> Self {
        let snapshot = Mutex::new(Arc::new(ModuleSnapshot::empty(now_from(&clock))));
        Self {
            config,
            factories,
            audit,
            enqueue,
            snapshot,
            reload_lock: tokio::sync::Mutex::new(()),
            loaded: AtomicBool::new(false),
            clock,
        }
    }

    fn now(&self) -> DateTime<Utc> {
        now_from(&self.clock)
    }

    /// Builds the initial snapshot and always activates it, tolerating
    /// per-module errors: bad candidates are skipped (not retried) and
    /// logged via the audit sink, but the modules that did build cleanly
    /// are installed rather than leaving the runtime on the empty
    /// version-0 snapshot. One-shot: a second call is a no-op that returns
    /// the same audit trail, it does not rebuild.
    pub async fn load(&self) -> Vec<ManifestLoadRecord> {
        if self.loaded.swap(true, Ordering::SeqCst) {
            return self.audit.all();
        }
        self.build_and_swap(SnapshotVersion::new()).await
    }

    /// Builds a new snapshot off to the side and swaps it in only if every
    /// candidate loaded cleanly; otherwise the prior snapshot is preserved.
    /// Serialized against concurrent reloads; a second caller while one is
    /// in flight gets `ReloadInProgress` immediately rather than queuing
    /// behind it.
    pub async fn reload(&self, _reload_id: Option<String>) -> Result<SnapshotVersion, RuntimeError> {
        let _guard = self.reload_lock.try_lock().map_err(|_| RuntimeError::ReloadInProgress)?;
        let version = SnapshotVersion::new();
        let records = self.build_snapshot_records(version, true).await;
        if records.iter().any(|r| r.outcome != ManifestLoadOutcome::Loaded) {
            Err(RuntimeError::ReloadFailed { records })
        } else {
            Ok(version)
        }
    }

    /// Builds a snapshot and always swaps it in, regardless of per-module
    /// errors. Used by `load()`, which has no prior good snapshot to fall
    /// back to.
    async fn build_and_swap(&self, version: SnapshotVersion) -> Vec<ManifestLoadRecord> {
        self.build_snapshot_records(version, false).await
    }

    async fn build_snapshot_records(&self, version: SnapshotVersion, gate_on_errors: bool) -> Vec<ManifestLoadRecord> {
        let candidates = discover_candidates(&self.config.roots);
        let ctx = BuildContext {
            factories: &self.factories,
            trust_mode: self.config.trust_mode,
            core_api_version: &self.config.core_api_version,
            runtime_profile_name: &self.config.runtime_profile_name,
            runtime_profile_version: &self.config.runtime_profile_version,
        };
        let outcome = build_snapshot(&candidates, &ctx, version, self.now());
        for record in &outcome.records {
            self.audit.record(record.clone());
        }
        if !gate_on_errors || !outcome.had_errors() {
            *self.snapshot.lock() = Arc::new(outcome.snapshot);
        }
        outcome.records
    }

    pub fn list_loaded_modules(&self) -> Vec<ModuleRecord> {
        self.snapshot.lock().modules.clone()
    }

    pub fn snapshot_info(&self) -> (SnapshotVersion, DateTime<Utc>) {
        let snapshot = self.snapshot.lock();
        (snapshot.version, snapshot.loaded_at)
    }

    /// Dispatches one event to every registered handler in total order,
    /// sequentially. Handler-requested enqueues are routed to the queue;
    /// handler-requested actions are reconciled winner-take-all and routed
    /// through `executor`, if supplied.
    pub async fn emit(&self, event: EventEnvelope, executor: Option<Arc<dyn ActionExecutorHandle>>) -> Vec<DispatchResult> {
        let snapshot = self.snapshot.lock().clone();
        let Some(handlers) = snapshot.handlers_by_event.get(&event.event_type) else {
            return Vec::new();
        };

        let mut results = Vec::with_capacity(handlers.len());
        let mut winner: Option<(String, String)> = None;

        for bound in handlers {
            match self.invoke_handler(bound, &event).await {
                Ok(HandlerOutput::EnqueueRequest { job_type, project_id, payload }) => {
                    let outcome = self.enqueue.enqueue(EnqueueInput::new(job_type, project_id, payload)).await;
                    results.push(match outcome {
                        Ok(outcome) => DispatchResult::EnqueueResult {
                            module_name: bound.registered.module_name.clone(),
                            status: outcome.status,
                            job: job_summary(&outcome.job),
                        },
                        Err(err) => DispatchResult::HandlerError {
                            module_name: bound.registered.module_name.clone(),
                            event_type: event.event_type.clone(),
                            message: err.to_string(),
                        },
                    });
                }
                Ok(HandlerOutput::HandlerResult { details }) => {
                    results.push(DispatchResult::HandlerResult { module_name: bound.registered.module_name.clone(), details });
                }
                Ok(HandlerOutput::ActionRequest(envelope)) => {
                    let result = self
                        .reconcile_action(&snapshot, &bound.registered.module_name, envelope, &event.scope, executor.as_ref(), &mut winner)
                        .await;
                    results.push(DispatchResult::ActionResult { module_name: bound.registered.module_name.clone(), result });
                }
                Err(message) => {
                    results.push(DispatchResult::HandlerError {
                        module_name: bound.registered.module_name.clone(),
                        event_type: event.event_type.clone(),
                        message,
                    });
                }
            }
        }
        results
    }

    /// Races one handler invocation against its own timeout on its own task,
    /// so a panic or a hang inside the handler can't take the rest of
    /// dispatch down with it (subject to the process's panic strategy).
    async fn invoke_handler(&self, bound: &BoundHandler, event: &EventEnvelope) -> Result<HandlerOutput, String> {
        let handler = bound.handler.clone();
        let event = event.clone();
        let task = tokio::spawn(async move { handler.handle(&event).await });
        match tokio::time::timeout(Duration::from_millis(bound.registered.timeout_ms), task).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(join_err)) => Err(format!("handler panicked: {join_err}")),
            Err(_elapsed) => Err("handler timed out".to_string()),
        }
    }

    async fn reconcile_action(
        &self,
        snapshot: &ModuleSnapshot,
        module_name: &str,
        envelope: conductor_core::ActionEnvelope,
        scope: &conductor_core::ActionScope,
        executor: Option<&Arc<dyn ActionExecutorHandle>>,
        winner: &mut Option<(String, String)>,
    ) -> ActionResult {
        if let Some((winner_module, winner_action)) = winner.as_ref() {
            return ActionResult::new(envelope.action_type.clone(), ActionStatus::NotEligible).with_envelope_ids(&envelope).with_details(
                ActionResultDetails::code_message("action_winner_already_selected", format!("winner: {winner_module} ({winner_action})")),
            );
        }

        let declared = snapshot.module_capabilities(module_name).map(|c| c.declares_action(&envelope.action_type)).unwrap_or(false);
        if !declared {
            match self.config.trust_mode {
                TrustMode::Enforced => {
                    return ActionResult::new(envelope.action_type.clone(), ActionStatus::Forbidden)
                        .with_envelope_ids(&envelope)
                        .with_details(ActionResultDetails::code("undeclared_capability"));
                }
                TrustMode::Warn => {
                    tracing::warn!(module = %module_name, action_type = %envelope.action_type, "undeclared action capability used");
                }
                TrustMode::Disabled => {}
            }
        }

        let Some(executor) = executor else {
            return ActionResult::new(envelope.action_type.clone(), ActionStatus::Failed)
                .with_envelope_ids(&envelope)
                .with_details(ActionResultDetails::code("action_executor_unavailable"));
        };

        let result = executor.execute(envelope, scope.clone()).await;
        if result.is_performed() {
            *winner = Some((module_name.to_string(), result.action_type.clone()));
        }
        result
    }
}

fn now_from<C: Clock>(clock: &C) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(clock.epoch_ms() as i64).single().unwrap_or_else(Utc::now)
}

fn job_summary(job: &Job) -> JobSummary {
    JobSummary { id: job.id.clone(), job_type: job.job_type.clone(), project_id: job.project_id.clone(), state: job.state }
}

#[cfg(test)]
#[path = "runtime_tests.rs"]
mod tests;
