// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Orchestrator Queue's public contract: `Enqueue`, `Cancel`, `Get`,
//! `ListByProject`, `WaitForTerminal`, and startup recovery. The actual
//! scheduling loop lives in [`crate::scheduler`], as further `impl` blocks
//! on [`OrchestratorQueue`].

use crate::definition::{fire_hook, DefinitionRegistry, JobRunContext, NoopProgressSink, ProgressSink};
use crate::error::QueueError;
use chrono::{DateTime, TimeZone, Utc};
use conductor_adapters::RuntimeProfileAdapter;
use conductor_core::{Clock, DedupeMode, EnqueueStatus, Job, JobId, JobState, Priority, SystemClock};
use conductor_storage::{QueueSnapshot, SnapshotStore};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, Mutex as AsyncMutex, Semaphore};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct QueueConfig {
    pub global_concurrency: usize,
    pub max_per_project: usize,
    pub max_global: usize,
    pub background_aging_ms: i64,
    pub max_interactive_burst: u32,
    pub drain_timeout: Duration,
    pub scheduler_tick: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            global_concurrency: 2,
            max_per_project: 100,
            max_global: 500,
            background_aging_ms: 15_000,
            max_interactive_burst: 3,
            drain_timeout: Duration::from_millis(10_000),
            scheduler_tick: Duration::from_millis(50),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EnqueueInput {
    pub job_type: String,
    pub project_id: String,
    pub source_session_id: Option<String>,
    pub priority: Option<Priority>,
    pub dedupe_key: Option<String>,
    pub payload: serde_json::Value,
}

impl EnqueueInput {
    pub fn new(job_type: impl Into<String>, project_id: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            job_type: job_type.into(),
            project_id: project_id.into(),
            source_session_id: None,
            priority: None,
            dedupe_key: None,
            payload,
        }
    }

    conductor_core::setters! {
        option {
            source_session_id: String,
            dedupe_key: String,
            priority: Priority,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EnqueueOutcome {
    pub status: EnqueueStatus,
    pub job: Job,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelStatus {
    NotFound,
    AlreadyTerminal,
    Canceled,
}

#[derive(Debug, Clone)]
pub struct CancelOutcome {
    pub status: CancelStatus,
    pub job: Option<Job>,
}

/// The scheduler's private state. `pub(crate)` so [`JobRunContext`] in
/// `definition.rs` can update `running_context` directly, and so
/// `scheduler.rs` can drive admission and dispatch.
pub(crate) struct Inner {
    pub(crate) jobs: HashMap<JobId, Job>,
    pub(crate) cancel_tokens: HashMap<JobId, CancellationToken>,
    pub(crate) waiters: HashMap<JobId, Vec<oneshot::Sender<Job>>>,
    pub(crate) project_burst: HashMap<String, u32>,
}

impl Inner {
    fn new() -> Self {
        Self { jobs: HashMap::new(), cancel_tokens: HashMap::new(), waiters: HashMap::new(), project_burst: HashMap::new() }
    }

    pub(crate) fn snapshot(&self) -> QueueSnapshot {
        let mut jobs: Vec<Job> = self.jobs.values().cloned().collect();
        jobs.sort_by_key(|j| j.created_at);
        QueueSnapshot::new(jobs)
    }

    pub(crate) fn running_projects(&self) -> HashSet<String> {
        self.jobs.values().filter(|j| j.state == JobState::Running).map(|j| j.project_id.clone()).collect()
    }

    pub(crate) fn notify_terminal(&mut self, job: &Job) {
        if let Some(waiters) = self.waiters.remove(&job.id) {
            for tx in waiters {
                let _ = tx.send(job.clone());
            }
        }
    }
}

pub(crate) struct QueueState<C: Clock> {
    pub(crate) inner: Arc<Mutex<Inner>>,
    pub(crate) definitions: Arc<DefinitionRegistry>,
    pub(crate) store: Arc<SnapshotStore>,
    pub(crate) adapter: Arc<dyn RuntimeProfileAdapter>,
    pub(crate) progress: Arc<dyn ProgressSink>,
    pub(crate) clock: C,
    pub(crate) config: QueueConfig,
    pub(crate) semaphore: Arc<Semaphore>,
    pub(crate) wake_tx: mpsc::UnboundedSender<()>,
    pub(crate) wake_rx: AsyncMutex<Option<mpsc::UnboundedReceiver<()>>>,
}

/// The Orchestrator Queue. Cheaply cloneable — every clone shares the same
/// job table, semaphore, and scheduler loop (started once via [`Self::start`]).
pub struct OrchestratorQueue<C: Clock = SystemClock>(pub(crate) Arc<QueueState<C>>);

impl<C: Clock> Clone for OrchestratorQueue<C> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<C: Clock + 'static> OrchestratorQueue<C> {
    pub fn new(
        definitions: Arc<DefinitionRegistry>,
        store: Arc<SnapshotStore>,
        adapter: Arc<dyn RuntimeProfileAdapter>,
        clock: C,
        config: QueueConfig,
    ) -> Self {
        Self::with_progress_sink(definitions, store, adapter, Arc::new(NoopProgressSink), clock, config)
    }

    pub fn with_progress_sink(
        definitions: Arc<DefinitionRegistry>,
        store: Arc<SnapshotStore>,
        adapter: Arc<dyn RuntimeProfileAdapter>,
        progress: Arc<dyn ProgressSink>,
        clock: C,
        config: QueueConfig,
    ) -> Self {
        let (wake_tx, wake_rx) = mpsc::unbounded_channel();
        let semaphore = Arc::new(Semaphore::new(config.global_concurrency.max(1)));
        Self(Arc::new(QueueState {
            inner: Arc::new(Mutex::new(Inner::new())),
            definitions,
            store,
            adapter,
            progress,
            clock,
            config,
            semaphore,
            wake_tx,
            wake_rx: AsyncMutex::new(Some(wake_rx)),
        }))
    }

    pub fn config(&self) -> &QueueConfig {
        &self.0.config
    }

    pub(crate) fn wake(&self) {
        let _ = self.0.wake_tx.send(());
    }

    /// `now()` sourced from the injected [`Clock`], not `Utc::now()`
    /// directly, so aging/backoff/timeout math is deterministic under
    /// `FakeClock` in tests.
    pub(crate) fn now(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.0.clock.epoch_ms() as i64).single().unwrap_or_else(Utc::now)
    }

    pub(crate) fn persist(&self, inner: &Inner) -> Result<(), QueueError> {
        self.0.store.save(&inner.snapshot())?;
        Ok(())
    }

    /// Fans out the terminal transition as a progress event
    /// (`job_completed`, `job_failed`, `job_canceled`). A no-op for
    /// non-terminal states.
    pub(crate) fn emit_terminal(&self, job: &Job) {
        let event_type = match job.state {
            JobState::Completed => "job_completed",
            JobState::Failed => "job_failed",
            JobState::Canceled => "job_canceled",
            _ => return,
        };
        let payload = serde_json::to_value(job).unwrap_or_default();
        self.0.progress.emit(job.id.clone(), event_type, payload);
    }

    pub async fn enqueue(&self, input: EnqueueInput) -> Result<EnqueueOutcome, QueueError> {
        let definition =
            self.0.definitions.get(&input.job_type).ok_or_else(|| QueueError::UnknownJobType(input.job_type.clone()))?;

        (definition.validate_payload)(&input.payload)
            .map_err(|message| QueueError::InvalidPayload { message })?;

        let mut guard = self.0.inner.lock();

        if definition.dedupe_mode != DedupeMode::None {
            let existing = guard
                .jobs
                .values()
                .find(|j| {
                    j.project_id == input.project_id
                        && j.job_type == definition.job_type
                        && j.dedupe_key == input.dedupe_key
                        && !j.state.is_terminal()
                })
                .cloned();

            if let Some(existing) = existing {
                return match definition.dedupe_mode {
                    DedupeMode::None => unreachable!("checked above"),
                    DedupeMode::SingleFlight | DedupeMode::DropDuplicate => {
                        Ok(EnqueueOutcome { status: EnqueueStatus::AlreadyQueued, job: existing })
                    }
                    DedupeMode::MergeDuplicate => {
                        let merge_fn = definition.merge.clone().ok_or_else(|| QueueError::InvalidPayload {
                            message: format!("job type {} declares merge_duplicate without a merge function", definition.job_type),
                        })?;
                        let merged = merge_fn(&existing.payload, &input.payload)
                            .map_err(|message| QueueError::InvalidPayload { message })?;
                        (definition.validate_payload)(&merged).map_err(|message| QueueError::InvalidPayload { message })?;
                        let mut updated = existing;
                        updated.payload = merged;
                        guard.jobs.insert(updated.id.clone(), updated.clone());
                        self.persist(&guard)?;
                        Ok(EnqueueOutcome { status: EnqueueStatus::AlreadyQueued, job: updated })
                    }
                };
            }
        }

        let global_active = guard.jobs.values().filter(|j| !j.state.is_terminal()).count();
        if global_active >= self.0.config.max_global {
            return Err(QueueError::QueueFull);
        }
        let project_active =
            guard.jobs.values().filter(|j| j.project_id == input.project_id && !j.state.is_terminal()).count();
        if project_active >= self.0.config.max_per_project {
            return Err(QueueError::QueueFull);
        }

        let mut job = Job::builder()
            .job_type(input.job_type.clone())
            .project_id(input.project_id.clone())
            .priority(input.priority.unwrap_or(definition.default_priority))
            .max_attempts(definition.max_attempts)
            .payload(input.payload.clone())
            .build();
        job.created_at = self.now();
        if let Some(dedupe_key) = input.dedupe_key.clone() {
            job.dedupe_key = Some(dedupe_key);
        }
        if let Some(source_session_id) = input.source_session_id.clone() {
            job.source_session_id = Some(source_session_id);
        }

        guard.jobs.insert(job.id.clone(), job.clone());
        self.persist(&guard)?;
        drop(guard);
        fire_hook(&definition.on_queued, "on_queued", &job);
        self.wake();
        Ok(EnqueueOutcome { status: EnqueueStatus::Enqueued, job })
    }

    pub async fn cancel(&self, job_id: &JobId, reason: impl Into<String>) -> Result<CancelOutcome, QueueError> {
        let reason = reason.into();
        let now = self.now();
        let mut guard = self.0.inner.lock();

        let Some(mut job) = guard.jobs.get(job_id).cloned() else {
            return Ok(CancelOutcome { status: CancelStatus::NotFound, job: None });
        };
        if job.state.is_terminal() {
            return Ok(CancelOutcome { status: CancelStatus::AlreadyTerminal, job: Some(job) });
        }

        job.cancel_requested_at = Some(now);

        if job.state == JobState::Queued {
            job.state = JobState::Canceled;
            job.completed_at = Some(now);
            job.error = Some(reason);
            job.running_context = None;
            guard.jobs.insert(job.id.clone(), job.clone());
            guard.notify_terminal(&job);
            self.persist(&guard)?;
            drop(guard);
            self.emit_terminal(&job);
            if let Some(definition) = self.0.definitions.get(&job.job_type) {
                fire_hook(&definition.on_canceled, "on_canceled", &job);
            }
            self.wake();
            return Ok(CancelOutcome { status: CancelStatus::Canceled, job: Some(job) });
        }

        // job.state == Running at this point (the only other non-terminal state).
        let definition = self.0.definitions.get(&job.job_type);
        guard.jobs.insert(job.id.clone(), job.clone());
        let token = guard.cancel_tokens.get(job_id).cloned();
        self.persist(&guard)?;
        drop(guard);

        match definition.as_ref().map(|d| d.cancel_strategy) {
            Some(conductor_core::CancelStrategy::MarkCanceled) | None => {
                if let Some(token) = token {
                    token.cancel();
                }
            }
            Some(conductor_core::CancelStrategy::InterruptTurn) => {
                if let Some(definition) = definition {
                    self.spawn_interrupt_cancel(job.clone(), definition);
                }
            }
        }

        Ok(CancelOutcome { status: CancelStatus::Canceled, job: Some(job) })
    }

    pub fn get(&self, job_id: &JobId) -> Option<Job> {
        self.0.inner.lock().jobs.get(job_id).cloned()
    }

    pub fn list_by_project(&self, project_id: &str, state: Option<JobState>) -> Vec<Job> {
        let guard = self.0.inner.lock();
        let mut jobs: Vec<Job> = guard
            .jobs
            .values()
            .filter(|j| j.project_id == project_id && state.map(|s| s == j.state).unwrap_or(true))
            .cloned()
            .collect();
        jobs.sort_by_key(|j| j.created_at);
        jobs
    }

    /// Resolves with the job's terminal state, or `None` if `timeout`
    /// elapses first. Never blocks the scheduler: the waiter list is
    /// notified from inside the scheduler's own lock, not polled.
    pub async fn wait_for_terminal(&self, job_id: &JobId, timeout: Duration) -> Option<Job> {
        let rx = {
            let mut guard = self.0.inner.lock();
            match guard.jobs.get(job_id) {
                Some(job) if job.state.is_terminal() => return Some(job.clone()),
                Some(_) => {
                    let (tx, rx) = oneshot::channel();
                    guard.waiters.entry(job_id.clone()).or_default().push(tx);
                    rx
                }
                None => return None,
            }
        };
        tokio::time::timeout(timeout, rx).await.ok().and_then(|r| r.ok())
    }

    /// Loads the last snapshot (if any), reclassifies any job recorded as
    /// `running` (a crash mid-run), persists the reclassified table once,
    /// then starts the scheduler loop. Call exactly once at startup.
    pub async fn start(&self) -> Result<(), QueueError> {
        self.recover()?;
        self.spawn_scheduler_loop();
        Ok(())
    }

    fn recover(&self) -> Result<(), QueueError> {
        let Some(snapshot) = self.0.store.load()? else {
            return Ok(());
        };
        let now = self.now();
        let mut guard = self.0.inner.lock();
        for mut job in snapshot.jobs {
            if job.state == JobState::Running {
                let definition = self.0.definitions.get(&job.job_type);
                let payload_ok = definition.as_ref().is_some_and(|d| (d.validate_payload)(&job.payload).is_ok());
                match definition {
                    None => {
                        job.state = JobState::Quarantined;
                        job.error = Some("recovery_unknown_job_type".into());
                        job.completed_at = Some(now);
                        job.running_context = None;
                    }
                    Some(_) if !payload_ok => {
                        job.state = JobState::Quarantined;
                        job.error = Some("recovery_invalid_payload".into());
                        job.completed_at = Some(now);
                        job.running_context = None;
                    }
                    Some(def) if job.attempts >= def.max_attempts => {
                        job.state = JobState::Failed;
                        job.error = Some("recovery_max_attempts_exceeded".into());
                        job.completed_at = Some(now);
                        job.running_context = None;
                    }
                    Some(_) => {
                        job.state = JobState::Queued;
                        job.error = Some("recovered_from_running_state".into());
                        job.next_attempt_at = Some(now);
                        job.running_context = None;
                    }
                }
            }
            guard.jobs.insert(job.id.clone(), job);
        }
        self.persist(&guard)?;
        Ok(())
    }

    #[cfg(any(test, feature = "test-support"))]
    pub fn seed_jobs_for_test(&self, jobs: Vec<Job>) {
        let mut guard = self.0.inner.lock();
        for job in jobs {
            guard.jobs.insert(job.id.clone(), job);
        }
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
