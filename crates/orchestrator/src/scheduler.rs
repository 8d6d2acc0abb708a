// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The scheduler loop: pick-next-runnable (priority + aging), run/timeout,
//! completion/failure with retry backoff, interrupt-style cancellation with
//! a grace window, and drain-on-teardown.

use crate::definition::{fire_hook, JobDefinition, JobRunContext, JobRunError};
use crate::queue::OrchestratorQueue;
use chrono::{DateTime, Utc};
use conductor_core::{Clock, Job, JobId, JobState, Priority, RetryClassification};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

struct Candidate {
    job_id: JobId,
    created_at: DateTime<Utc>,
    project_id: String,
    aged: bool,
    interactive: bool,
}

enum RunOutcome {
    Finished(Result<serde_json::Value, JobRunError>),
    TimedOut,
    Cancelled,
}

impl<C: Clock + 'static> OrchestratorQueue<C> {
    /// One scheduling pass: start as many runnable jobs as there are free
    /// concurrency permits, then return. Called on every wake signal and
    /// on every scheduler tick interval (to catch expired retry timers and
    /// background aging promotions).
    pub(crate) async fn tick(&self) {
        loop {
            let permit = match self.0.semaphore.clone().try_acquire_owned() {
                Ok(permit) => permit,
                Err(_) => break,
            };
            match self.pick_and_start() {
                Some((job, definition, token)) => self.spawn_run(job, definition, token, permit),
                None => break,
            }
        }
    }

    /// Selects the next runnable job under one project/running exclusion,
    /// priority, and aging, transitions it to `running`, and persists.
    /// Holds the inner lock for the whole selection + transition so a
    /// concurrent `tick()` never double-starts the same project.
    fn pick_and_start(&self) -> Option<(Job, Arc<JobDefinition>, CancellationToken)> {
        let mut guard = self.0.inner.lock();
        let now = self.now();
        let running_projects = guard.running_projects();

        let mut candidates: Vec<Candidate> = Vec::new();
        for job in guard.jobs.values() {
            if job.state != JobState::Queued {
                continue;
            }
            if running_projects.contains(&job.project_id) {
                continue;
            }
            if let Some(next_attempt_at) = job.next_attempt_at {
                if next_attempt_at > now {
                    continue;
                }
            }
            if self.0.definitions.get(&job.job_type).is_none() {
                continue;
            }
            let age_ms = (now - job.created_at).num_milliseconds();
            let burst = *guard.project_burst.get(&job.project_id).unwrap_or(&0);
            let aged = job.priority == Priority::Background
                && age_ms >= self.0.config.background_aging_ms
                && burst >= self.0.config.max_interactive_burst;
            candidates.push(Candidate {
                job_id: job.id.clone(),
                created_at: job.created_at,
                project_id: job.project_id.clone(),
                aged,
                interactive: job.priority == Priority::Interactive,
            });
        }

        candidates.sort_by(|a, b| {
            let tier = |c: &Candidate| if c.aged { 0 } else if c.interactive { 1 } else { 2 };
            tier(a).cmp(&tier(b)).then(a.created_at.cmp(&b.created_at))
        });

        let chosen = candidates.into_iter().next()?;
        let mut job = guard.jobs.get(&chosen.job_id)?.clone();
        let definition = self.0.definitions.get(&job.job_type)?;

        job.state = JobState::Running;
        job.started_at = Some(now);
        job.last_attempt_at = Some(now);
        job.attempts += 1;
        job.error = None;
        job.result = None;
        job.running_context = None;

        if job.priority == Priority::Interactive {
            *guard.project_burst.entry(chosen.project_id.clone()).or_insert(0) += 1;
        } else {
            guard.project_burst.insert(chosen.project_id.clone(), 0);
        }

        guard.jobs.insert(job.id.clone(), job.clone());
        let token = CancellationToken::new();
        guard.cancel_tokens.insert(job.id.clone(), token.clone());
        if let Err(err) = self.persist(&guard) {
            tracing::warn!(error = %err, job_id = %job.id, "failed to persist snapshot after starting job");
        }
        drop(guard);

        fire_hook(&definition.on_started, "on_started", &job);
        Some((job, definition, token))
    }

    fn spawn_run(
        &self,
        job: Job,
        definition: Arc<JobDefinition>,
        token: CancellationToken,
        permit: tokio::sync::OwnedSemaphorePermit,
    ) {
        let queue = self.clone();
        let job_id = job.id.clone();
        let payload = job.payload.clone();
        let ctx = JobRunContext {
            job_id: job_id.clone(),
            cancel: token.clone(),
            inner: self.0.inner.clone(),
            progress: self.0.progress.clone(),
        };
        let timeout = definition.timeout;
        let runner = definition.runner.clone();

        tokio::spawn(async move {
            let _permit = permit;
            let outcome = tokio::select! {
                result = tokio::time::timeout(timeout, runner.run(ctx, payload)) => {
                    match result {
                        Ok(run_result) => RunOutcome::Finished(run_result),
                        Err(_elapsed) => RunOutcome::TimedOut,
                    }
                }
                _ = token.cancelled() => RunOutcome::Cancelled,
            };
            queue.finish_run(job_id, definition, outcome).await;
        });
    }

    async fn finish_run(&self, job_id: JobId, definition: Arc<JobDefinition>, outcome: RunOutcome) {
        let now = self.now();
        let mut guard = self.0.inner.lock();
        guard.cancel_tokens.remove(&job_id);
        let Some(mut job) = guard.jobs.get(&job_id).cloned() else {
            return;
        };

        match outcome {
            RunOutcome::Cancelled => {
                job.state = JobState::Canceled;
                job.completed_at = Some(now);
                job.running_context = None;
                if job.error.is_none() {
                    job.error = Some("canceled".into());
                }
            }
            RunOutcome::TimedOut => {
                self.apply_failure(&mut job, &definition, JobRunError::new("job timed out"), now);
            }
            RunOutcome::Finished(Ok(result)) => match (definition.validate_result)(&result) {
                Ok(()) => {
                    job.state = JobState::Completed;
                    job.completed_at = Some(now);
                    job.result = Some(result);
                    job.running_context = None;
                }
                Err(message) => {
                    self.apply_failure(&mut job, &definition, JobRunError::new(format!("invalid result: {message}")), now);
                }
            },
            RunOutcome::Finished(Err(run_err)) => {
                self.apply_failure(&mut job, &definition, run_err, now);
            }
        }

        guard.jobs.insert(job.id.clone(), job.clone());
        guard.notify_terminal(&job);
        if let Err(err) = self.persist(&guard) {
            tracing::warn!(error = %err, job_id = %job.id, "failed to persist snapshot after run completion");
        }
        drop(guard);

        self.emit_terminal(&job);
        let hook = match job.state {
            JobState::Completed => Some((&definition.on_completed, "on_completed")),
            JobState::Failed => Some((&definition.on_failed, "on_failed")),
            JobState::Canceled => Some((&definition.on_canceled, "on_canceled")),
            _ => None,
        };
        if let Some((hook, hook_name)) = hook {
            fire_hook(hook, hook_name, &job);
        }
        self.wake();
    }

    fn apply_failure(&self, job: &mut Job, definition: &JobDefinition, err: JobRunError, now: DateTime<Utc>) {
        let classification = (definition.retry_classify)(&err);
        if classification == RetryClassification::Retryable && job.attempts < job.max_attempts {
            job.state = JobState::Queued;
            job.error = Some(err.message.clone());
            let delay = chrono::Duration::from_std((definition.delay_for_attempt)(job.attempts)).unwrap_or_default();
            job.next_attempt_at = Some(now + delay);
            job.running_context = None;
        } else {
            job.state = JobState::Failed;
            job.completed_at = Some(now);
            job.error = Some(err.message.clone());
            job.running_context = None;
        }
    }

    /// Calls the adapter's `interrupt_turn`, then waits `graceful_wait`
    /// before forcing the run's cancellation token — the run function may
    /// ignore the signal entirely and the job still terminates on time.
    pub(crate) fn spawn_interrupt_cancel(&self, job: Job, definition: Arc<JobDefinition>) {
        let queue = self.clone();
        tokio::spawn(async move {
            if let Some(ctx) = job.running_context.clone() {
                if let Err(err) = queue.0.adapter.interrupt_turn(&ctx.thread_id, &ctx.turn_id).await {
                    tracing::warn!(error = %err, job_id = %job.id, "interrupt_turn failed");
                }
            }
            tokio::time::sleep(definition.graceful_wait).await;

            let still_running = queue.get(&job.id).map(|j| j.state == JobState::Running).unwrap_or(false);
            if !still_running {
                return;
            }
            let token = {
                let guard = queue.0.inner.lock();
                guard.cancel_tokens.get(&job.id).cloned()
            };
            match token {
                Some(token) => token.cancel(),
                None => queue.force_cancel(&job.id).await,
            }
        });
    }

    async fn force_cancel(&self, job_id: &JobId) {
        let now = self.now();
        let mut guard = self.0.inner.lock();
        let Some(mut job) = guard.jobs.get(job_id).cloned() else { return };
        if job.state.is_terminal() {
            return;
        }
        job.state = JobState::Canceled;
        job.completed_at = Some(now);
        job.running_context = None;
        guard.jobs.insert(job.id.clone(), job.clone());
        guard.notify_terminal(&job);
        if let Err(err) = self.persist(&guard) {
            tracing::warn!(error = %err, job_id = %job_id, "failed to persist snapshot after forced cancel");
        }
        drop(guard);

        self.emit_terminal(&job);
        if let Some(definition) = self.0.definitions.get(&job.job_type) {
            fire_hook(&definition.on_canceled, "on_canceled", &job);
        }
    }

    /// Starts the background scheduler loop. Idempotent only in the sense
    /// that calling it twice spawns two loops racing on the same state —
    /// callers (the daemon composition root) must call this exactly once.
    pub(crate) fn spawn_scheduler_loop(&self) {
        let queue = self.clone();
        tokio::spawn(async move {
            let receiver = { queue.0.wake_rx.lock().await.take() };
            let Some(mut wake_rx) = receiver else { return };
            let mut interval = tokio::time::interval(queue.0.config.scheduler_tick);
            loop {
                tokio::select! {
                    _ = wake_rx.recv() => {}
                    _ = interval.tick() => {}
                }
                queue.tick().await;
            }
        });
    }

    /// Waits up to `timeout` for all running jobs to finish; any still
    /// running past the deadline are force-aborted via their cancellation
    /// token. Called once by the daemon composition root during shutdown.
    pub async fn drain(&self, timeout: Duration) {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let running: Vec<JobId> = {
                let guard = self.0.inner.lock();
                guard.jobs.values().filter(|j| j.state == JobState::Running).map(|j| j.id.clone()).collect()
            };
            if running.is_empty() {
                break;
            }
            if tokio::time::Instant::now() >= deadline {
                tracing::warn!(count = running.len(), "drain timeout elapsed, aborting remaining jobs");
                for job_id in running {
                    let token = {
                        let guard = self.0.inner.lock();
                        guard.cancel_tokens.get(&job_id).cloned()
                    };
                    match token {
                        Some(token) => token.cancel(),
                        None => self.force_cancel(&job_id).await,
                    }
                }
                break;
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
    }
}
