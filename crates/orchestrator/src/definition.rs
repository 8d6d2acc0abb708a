// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job Definitions Registry: per-job-type configuration (payload/result
//! validation, retry classifier, dedupe mode, timeout, cancel strategy,
//! delay function) and the run function itself.

use crate::queue::Inner;
use async_trait::async_trait;
use conductor_core::{CancelStrategy, DedupeMode, Job, JobId, Priority, RetryClassification, RunningContext};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Error returned by a job's `run` function. Opaque on purpose — the
/// definition's own `retry_classify` is what gives it meaning.
#[derive(Debug, Clone)]
pub struct JobRunError {
    pub message: String,
}

impl JobRunError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

impl fmt::Display for JobRunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for JobRunError {}

/// Sink for `ctx.emit_progress`, fanned out as an event by whatever owns
/// the queue (the daemon composition root wires this to the agent events
/// runtime). The queue itself never depends on the events crate.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, job_id: JobId, event_type: &str, payload: serde_json::Value);
}

#[derive(Default)]
pub struct NoopProgressSink;

impl ProgressSink for NoopProgressSink {
    fn emit(&self, _job_id: JobId, _event_type: &str, _payload: serde_json::Value) {}
}

/// Handed to a job's `run` function. Exposes the cancellation signal and
/// the two side channels a run function is allowed to use: updating the
/// persisted running context, and emitting progress events.
pub struct JobRunContext {
    pub(crate) job_id: JobId,
    pub(crate) cancel: CancellationToken,
    pub(crate) inner: Arc<Mutex<Inner>>,
    pub(crate) progress: Arc<dyn ProgressSink>,
}

impl JobRunContext {
    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves once this run has been cancelled or timed out.
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }

    pub fn set_running_context(&self, thread_id: impl Into<String>, turn_id: impl Into<String>) {
        let mut guard = self.inner.lock();
        if let Some(job) = guard.jobs.get_mut(&self.job_id) {
            job.running_context = Some(RunningContext { thread_id: thread_id.into(), turn_id: turn_id.into() });
        }
    }

    pub fn emit_progress(&self, payload: serde_json::Value) {
        self.progress.emit(self.job_id.clone(), "job.progress", payload);
    }
}

#[async_trait]
pub trait JobRunner: Send + Sync {
    async fn run(&self, ctx: JobRunContext, payload: serde_json::Value) -> Result<serde_json::Value, JobRunError>;
}

pub type RetryClassifier = Arc<dyn Fn(&JobRunError) -> RetryClassification + Send + Sync>;
pub type DelayForAttempt = Arc<dyn Fn(u32) -> Duration + Send + Sync>;
pub type PayloadValidator = Arc<dyn Fn(&serde_json::Value) -> Result<(), String> + Send + Sync>;
pub type ResultValidator = Arc<dyn Fn(&serde_json::Value) -> Result<(), String> + Send + Sync>;
pub type MergeFn = Arc<dyn Fn(&serde_json::Value, &serde_json::Value) -> Result<serde_json::Value, String> + Send + Sync>;

/// A lifecycle hook. Per `Failure Semantics`, a hook's own failure is
/// logged and swallowed by the caller — it never influences job state.
pub type JobHook = Arc<dyn Fn(&Job) -> Result<(), String> + Send + Sync>;

fn accept_any(_: &serde_json::Value) -> Result<(), String> {
    Ok(())
}

fn default_retry_classifier(_: &JobRunError) -> RetryClassification {
    RetryClassification::Retryable
}

const DEFAULT_BASE_DELAY_MS: u64 = 500;
const DEFAULT_MAX_DELAY_MS: u64 = 30_000;

/// Exponential backoff, base × 2^(attempt-1), capped, plus up-to-25% jitter.
fn default_delay_for_attempt(attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(10);
    let raw = DEFAULT_BASE_DELAY_MS.saturating_mul(1u64 << exponent);
    let capped = raw.min(DEFAULT_MAX_DELAY_MS);
    let jitter = rand::random::<u64>() % (capped / 4 + 1);
    Duration::from_millis(capped + jitter)
}

/// Per-job-type configuration. Construct via [`JobDefinition::builder`].
pub struct JobDefinition {
    pub job_type: String,
    pub default_priority: Priority,
    pub dedupe_mode: DedupeMode,
    pub max_attempts: u32,
    pub timeout: Duration,
    pub cancel_strategy: CancelStrategy,
    pub graceful_wait: Duration,
    pub runner: Arc<dyn JobRunner>,
    pub retry_classify: RetryClassifier,
    pub delay_for_attempt: DelayForAttempt,
    pub validate_payload: PayloadValidator,
    pub validate_result: ResultValidator,
    pub merge: Option<MergeFn>,
    pub on_queued: Option<JobHook>,
    pub on_started: Option<JobHook>,
    pub on_completed: Option<JobHook>,
    pub on_failed: Option<JobHook>,
    pub on_canceled: Option<JobHook>,
}

impl JobDefinition {
    pub fn builder(job_type: impl Into<String>, runner: Arc<dyn JobRunner>) -> JobDefinitionBuilder {
        JobDefinitionBuilder::new(job_type, runner)
    }
}

pub struct JobDefinitionBuilder {
    job_type: String,
    default_priority: Priority,
    dedupe_mode: DedupeMode,
    max_attempts: u32,
    timeout: Duration,
    cancel_strategy: CancelStrategy,
    graceful_wait: Duration,
    runner: Arc<dyn JobRunner>,
    retry_classify: RetryClassifier,
    delay_for_attempt: DelayForAttempt,
    validate_payload: PayloadValidator,
    validate_result: ResultValidator,
    merge: Option<MergeFn>,
    on_queued: Option<JobHook>,
    on_started: Option<JobHook>,
    on_completed: Option<JobHook>,
    on_failed: Option<JobHook>,
    on_canceled: Option<JobHook>,
}

impl JobDefinitionBuilder {
    pub fn new(job_type: impl Into<String>, runner: Arc<dyn JobRunner>) -> Self {
        Self {
            job_type: job_type.into(),
            default_priority: Priority::Background,
            dedupe_mode: DedupeMode::None,
            max_attempts: 2,
            timeout: Duration::from_millis(60_000),
            cancel_strategy: CancelStrategy::MarkCanceled,
            graceful_wait: Duration::from_millis(5_000),
            runner,
            retry_classify: Arc::new(default_retry_classifier),
            delay_for_attempt: Arc::new(default_delay_for_attempt),
            validate_payload: Arc::new(accept_any),
            validate_result: Arc::new(accept_any),
            merge: None,
            on_queued: None,
            on_started: None,
            on_completed: None,
            on_failed: None,
            on_canceled: None,
        }
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.default_priority = priority;
        self
    }

    pub fn dedupe_mode(mut self, mode: DedupeMode) -> Self {
        self.dedupe_mode = mode;
        self
    }

    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn cancel_strategy(mut self, strategy: CancelStrategy) -> Self {
        self.cancel_strategy = strategy;
        self
    }

    pub fn graceful_wait(mut self, wait: Duration) -> Self {
        self.graceful_wait = wait;
        self
    }

    pub fn retry_classify<F>(mut self, f: F) -> Self
    where
        F: Fn(&JobRunError) -> RetryClassification + Send + Sync + 'static,
    {
        self.retry_classify = Arc::new(f);
        self
    }

    pub fn delay_for_attempt<F>(mut self, f: F) -> Self
    where
        F: Fn(u32) -> Duration + Send + Sync + 'static,
    {
        self.delay_for_attempt = Arc::new(f);
        self
    }

    pub fn validate_payload<F>(mut self, f: F) -> Self
    where
        F: Fn(&serde_json::Value) -> Result<(), String> + Send + Sync + 'static,
    {
        self.validate_payload = Arc::new(f);
        self
    }

    pub fn validate_result<F>(mut self, f: F) -> Self
    where
        F: Fn(&serde_json::Value) -> Result<(), String> + Send + Sync + 'static,
    {
        self.validate_result = Arc::new(f);
        self
    }

    pub fn merge<F>(mut self, f: F) -> Self
    where
        F: Fn(&serde_json::Value, &serde_json::Value) -> Result<serde_json::Value, String> + Send + Sync + 'static,
    {
        self.merge = Some(Arc::new(f));
        self
    }

    pub fn on_queued<F>(mut self, f: F) -> Self
    where
        F: Fn(&Job) -> Result<(), String> + Send + Sync + 'static,
    {
        self.on_queued = Some(Arc::new(f));
        self
    }

    pub fn on_started<F>(mut self, f: F) -> Self
    where
        F: Fn(&Job) -> Result<(), String> + Send + Sync + 'static,
    {
        self.on_started = Some(Arc::new(f));
        self
    }

    pub fn on_completed<F>(mut self, f: F) -> Self
    where
        F: Fn(&Job) -> Result<(), String> + Send + Sync + 'static,
    {
        self.on_completed = Some(Arc::new(f));
        self
    }

    pub fn on_failed<F>(mut self, f: F) -> Self
    where
        F: Fn(&Job) -> Result<(), String> + Send + Sync + 'static,
    {
        self.on_failed = Some(Arc::new(f));
        self
    }

    pub fn on_canceled<F>(mut self, f: F) -> Self
    where
        F: Fn(&Job) -> Result<(), String> + Send + Sync + 'static,
    {
        self.on_canceled = Some(Arc::new(f));
        self
    }

    pub fn build(self) -> JobDefinition {
        JobDefinition {
            job_type: self.job_type,
            default_priority: self.default_priority,
            dedupe_mode: self.dedupe_mode,
            max_attempts: self.max_attempts,
            timeout: self.timeout,
            cancel_strategy: self.cancel_strategy,
            graceful_wait: self.graceful_wait,
            runner: self.runner,
            retry_classify: self.retry_classify,
            delay_for_attempt: self.delay_for_attempt,
            validate_payload: self.validate_payload,
            validate_result: self.validate_result,
            merge: self.merge,
            on_queued: self.on_queued,
            on_started: self.on_started,
            on_completed: self.on_completed,
            on_failed: self.on_failed,
            on_canceled: self.on_canceled,
        }
    }
}

/// Invokes a lifecycle hook if the definition registered one. Per
/// `Failure Semantics`, a hook error is logged and swallowed, never
/// propagated into job state.
pub(crate) fn fire_hook(hook: &Option<JobHook>, hook_name: &'static str, job: &Job) {
    if let Some(hook) = hook {
        if let Err(message) = hook(job) {
            tracing::warn!(job_id = %job.id, hook = hook_name, error = %message, "lifecycle hook failed");
        }
    }
}

#[derive(Default)]
pub struct DefinitionRegistry {
    definitions: HashMap<String, Arc<JobDefinition>>,
}

impl DefinitionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, definition: JobDefinition) {
        self.definitions.insert(definition.job_type.clone(), Arc::new(definition));
    }

    pub fn get(&self, job_type: &str) -> Option<Arc<JobDefinition>> {
        self.definitions.get(job_type).cloned()
    }
}

#[cfg(test)]
#[path = "definition_tests.rs"]
mod tests;
