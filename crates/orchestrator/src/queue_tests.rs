use super::*;
use crate::definition::{JobDefinition, JobRunContext, JobRunError, JobRunner};
use async_trait::async_trait;
use conductor_adapters::FixtureRuntimeProfileAdapter;
use conductor_core::test_support::queued_job;
use conductor_core::{CancelStrategy, DedupeMode, JobState, RunningContext, SystemClock};
use conductor_storage::SnapshotStore;
use parking_lot::Mutex as SyncMutex;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

#[derive(Default)]
struct RecordingProgressSink {
    events: SyncMutex<Vec<(JobId, String)>>,
}

impl ProgressSink for RecordingProgressSink {
    fn emit(&self, job_id: JobId, event_type: &str, _payload: serde_json::Value) {
        self.events.lock().push((job_id, event_type.to_string()));
    }
}

struct EchoRunner;

#[async_trait]
impl JobRunner for EchoRunner {
    async fn run(&self, _ctx: JobRunContext, payload: Value) -> Result<Value, JobRunError> {
        Ok(payload)
    }
}

struct FlakyRunner {
    fail_until_attempt: u32,
    calls: parking_lot::Mutex<u32>,
}

#[async_trait]
impl JobRunner for FlakyRunner {
    async fn run(&self, _ctx: JobRunContext, payload: Value) -> Result<Value, JobRunError> {
        let attempt = {
            let mut calls = self.calls.lock();
            *calls += 1;
            *calls
        };
        if attempt < self.fail_until_attempt {
            return Err(JobRunError::new("transient failure"));
        }
        Ok(payload)
    }
}

struct SleepyRunner;

#[async_trait]
impl JobRunner for SleepyRunner {
    async fn run(&self, ctx: JobRunContext, _payload: Value) -> Result<Value, JobRunError> {
        ctx.set_running_context("thread-1", "turn-1");
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(json!({}))
    }
}

/// Builds a queue backed by a snapshot path inside `dir`. The caller keeps
/// `dir` (a [`tempfile::TempDir`]) alive for as long as the queue is used.
fn test_queue(dir: &tempfile::TempDir, registry: DefinitionRegistry, config: QueueConfig) -> OrchestratorQueue<SystemClock> {
    let store = Arc::new(SnapshotStore::new(dir.path().join("orchestrator-jobs.json")));
    let adapter = FixtureRuntimeProfileAdapter::new();
    OrchestratorQueue::new(Arc::new(registry), store, adapter, SystemClock, config)
}

#[tokio::test]
async fn enqueue_unknown_job_type_errors() {
    let dir = tempdir().expect("tempdir");
    let queue = test_queue(&dir, DefinitionRegistry::new(), QueueConfig::default());
    let err = queue.enqueue(EnqueueInput::new("missing", "proj-a", json!({}))).await.unwrap_err();
    assert!(matches!(err, QueueError::UnknownJobType(ref t) if t == "missing"));
}

#[tokio::test]
async fn enqueue_invalid_payload_errors() {
    let mut registry = DefinitionRegistry::new();
    registry.register(
        JobDefinition::builder("strict", Arc::new(EchoRunner))
            .validate_payload(|v| if v.get("ok").is_some() { Ok(()) } else { Err("missing ok".into()) })
            .build(),
    );
    let dir = tempdir().expect("tempdir");
    let queue = test_queue(&dir, registry, QueueConfig::default());
    let err = queue.enqueue(EnqueueInput::new("strict", "proj-a", json!({}))).await.unwrap_err();
    assert!(matches!(err, QueueError::InvalidPayload { .. }));
}

#[tokio::test]
async fn single_flight_dedupe_returns_already_queued_with_same_job() {
    let mut registry = DefinitionRegistry::new();
    registry.register(JobDefinition::builder("t", Arc::new(EchoRunner)).dedupe_mode(DedupeMode::SingleFlight).build());
    let dir = tempdir().expect("tempdir");
    let queue = test_queue(&dir, registry, QueueConfig::default());

    let first = queue
        .enqueue(EnqueueInput::new("t", "proj-a", json!({})).dedupe_key("k1"))
        .await
        .expect("first enqueue");
    let second = queue
        .enqueue(EnqueueInput::new("t", "proj-a", json!({})).dedupe_key("k1"))
        .await
        .expect("second enqueue");

    assert_eq!(first.status, EnqueueStatus::Enqueued);
    assert_eq!(second.status, EnqueueStatus::AlreadyQueued);
    assert_eq!(first.job.id, second.job.id);
}

#[tokio::test]
async fn max_per_project_rejects_enqueue() {
    let mut registry = DefinitionRegistry::new();
    registry.register(JobDefinition::builder("t", Arc::new(EchoRunner)).build());
    let mut config = QueueConfig::default();
    config.max_per_project = 1;
    let dir = tempdir().expect("tempdir");
    let queue = test_queue(&dir, registry, config);

    queue.enqueue(EnqueueInput::new("t", "proj-a", json!({}))).await.expect("first fits");
    let err = queue.enqueue(EnqueueInput::new("t", "proj-a", json!({}))).await.unwrap_err();
    assert!(matches!(err, QueueError::QueueFull));
}

#[tokio::test]
async fn cancel_unknown_job_returns_not_found() {
    let dir = tempdir().expect("tempdir");
    let queue = test_queue(&dir, DefinitionRegistry::new(), QueueConfig::default());
    let outcome = queue.cancel(&conductor_core::JobId::new(), "nope").await.expect("cancel");
    assert_eq!(outcome.status, CancelStatus::NotFound);
}

#[tokio::test]
async fn cancel_queued_job_transitions_immediately() {
    let mut registry = DefinitionRegistry::new();
    registry.register(JobDefinition::builder("t", Arc::new(EchoRunner)).build());
    let dir = tempdir().expect("tempdir");
    let queue = test_queue(&dir, registry, QueueConfig::default());

    let enqueued = queue.enqueue(EnqueueInput::new("t", "proj-a", json!({}))).await.expect("enqueue");
    let outcome = queue.cancel(&enqueued.job.id, "user requested").await.expect("cancel");

    assert_eq!(outcome.status, CancelStatus::Canceled);
    let job = outcome.job.expect("job present");
    assert_eq!(job.state, JobState::Canceled);
    assert_eq!(job.error.as_deref(), Some("user requested"));
}

#[tokio::test]
async fn crash_recovery_quarantines_unknown_job_type() {
    let dir = tempdir().expect("tempdir");
    let store_path = dir.path().join("orchestrator-jobs.json");
    let store = SnapshotStore::new(&store_path);

    let mut orphaned = queued_job("proj-a", "ghost.job");
    orphaned.state = JobState::Running;
    orphaned.running_context = Some(RunningContext { thread_id: "t".into(), turn_id: "u".into() });
    store.save(&conductor_storage::QueueSnapshot::new(vec![orphaned.clone()])).expect("save snapshot");

    let queue =
        OrchestratorQueue::new(Arc::new(DefinitionRegistry::new()), Arc::new(store), FixtureRuntimeProfileAdapter::new(), SystemClock, QueueConfig::default());
    queue.start().await.expect("start");

    let recovered = queue.get(&orphaned.id).expect("job recovered");
    assert_eq!(recovered.state, JobState::Quarantined);
}

#[tokio::test]
async fn crash_recovery_requeues_running_job_with_attempts_remaining() {
    let dir = tempdir().expect("tempdir");
    let store_path = dir.path().join("orchestrator-jobs.json");
    let store = SnapshotStore::new(&store_path);

    let mut running = queued_job("proj-a", "resumable");
    running.state = JobState::Running;
    running.attempts = 1;
    running.max_attempts = 2;
    running.running_context = Some(RunningContext { thread_id: "t".into(), turn_id: "u".into() });
    store.save(&conductor_storage::QueueSnapshot::new(vec![running.clone()])).expect("save snapshot");

    let mut registry = DefinitionRegistry::new();
    registry.register(JobDefinition::builder("resumable", Arc::new(EchoRunner)).build());

    let queue = OrchestratorQueue::new(Arc::new(registry), Arc::new(store), FixtureRuntimeProfileAdapter::new(), SystemClock, QueueConfig::default());
    queue.start().await.expect("start");

    let recovered = queue.get(&running.id).expect("job recovered");
    assert_eq!(recovered.state, JobState::Queued);
    assert_eq!(recovered.error.as_deref(), Some("recovered_from_running_state"));
    assert!(recovered.running_context.is_none());
}

/// End-to-end scenario 6: single-flight dedupe collapses a rapid double
/// enqueue onto one job; a retryable first-attempt failure is requeued and
/// the second attempt completes.
#[tokio::test]
async fn scheduler_single_flight_dedupe_and_retry_then_completes() {
    let mut registry = DefinitionRegistry::new();
    registry.register(
        JobDefinition::builder("flaky", Arc::new(FlakyRunner { fail_until_attempt: 2, calls: parking_lot::Mutex::new(0) }))
            .dedupe_mode(DedupeMode::SingleFlight)
            .max_attempts(2)
            .delay_for_attempt(|_| Duration::from_millis(10))
            .build(),
    );
    let dir = tempdir().expect("tempdir");
    let queue = test_queue(&dir, registry, QueueConfig::default());
    queue.start().await.expect("start");

    let first = queue
        .enqueue(EnqueueInput::new("flaky", "proj-a", json!({"n": 1})).dedupe_key("k"))
        .await
        .expect("first enqueue");
    let second = queue
        .enqueue(EnqueueInput::new("flaky", "proj-a", json!({"n": 1})).dedupe_key("k"))
        .await
        .expect("second enqueue");
    assert_eq!(second.status, EnqueueStatus::AlreadyQueued);
    assert_eq!(second.job.id, first.job.id);

    let terminal = queue.wait_for_terminal(&first.job.id, Duration::from_secs(5)).await.expect("terminal");
    assert_eq!(terminal.state, JobState::Completed);
    assert_eq!(terminal.attempts, 2);
}

/// End-to-end scenario 7: cancelling a job whose definition uses
/// `interrupt_turn` calls the adapter's `interrupt_turn`, then forces the
/// job to `canceled` once the grace window elapses, even though the run
/// function never observes the cancellation signal.
#[tokio::test]
async fn scheduler_cancel_with_interrupt_strategy_forces_abort() {
    let mut registry = DefinitionRegistry::new();
    registry.register(
        JobDefinition::builder("interrupt-me", Arc::new(SleepyRunner))
            .cancel_strategy(CancelStrategy::InterruptTurn)
            .graceful_wait(Duration::from_millis(50))
            .build(),
    );
    let adapter = FixtureRuntimeProfileAdapter::new();
    let dir = tempdir().expect("tempdir");
    let store = Arc::new(SnapshotStore::new(dir.path().join("orchestrator-jobs.json")));
    let queue = OrchestratorQueue::new(Arc::new(registry), store, adapter.clone(), SystemClock, QueueConfig::default());
    queue.start().await.expect("start");

    let enqueued = queue.enqueue(EnqueueInput::new("interrupt-me", "proj-a", json!({}))).await.expect("enqueue");

    // Wait for the scheduler to actually start the run (sets running_context).
    for _ in 0..50 {
        if queue.get(&enqueued.job.id).map(|j| j.running_context.is_some()).unwrap_or(false) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    queue.cancel(&enqueued.job.id, "user requested").await.expect("cancel");

    let terminal = queue.wait_for_terminal(&enqueued.job.id, Duration::from_millis(500)).await.expect("terminal");
    assert_eq!(terminal.state, JobState::Canceled);
    assert_eq!(adapter.interrupted_turns(), vec![("thread-1".to_string(), "turn-1".to_string())]);
}

/// A job that completes fans out `job_completed` and fires `on_completed`;
/// `on_queued`/`on_started` fire on their own transitions too.
#[tokio::test]
async fn completion_fans_out_job_completed_and_fires_lifecycle_hooks() {
    let queued_log = Arc::new(SyncMutex::new(Vec::new()));
    let started_log = Arc::new(SyncMutex::new(Vec::new()));
    let completed_log = Arc::new(SyncMutex::new(Vec::new()));
    let (queued_log2, started_log2, completed_log2) = (queued_log.clone(), started_log.clone(), completed_log.clone());

    let mut registry = DefinitionRegistry::new();
    registry.register(
        JobDefinition::builder("echo", Arc::new(EchoRunner))
            .on_queued(move |job| {
                queued_log2.lock().push(job.id.clone());
                Ok(())
            })
            .on_started(move |job| {
                started_log2.lock().push(job.id.clone());
                Ok(())
            })
            .on_completed(move |job| {
                completed_log2.lock().push(job.id.clone());
                Ok(())
            })
            .build(),
    );

    let dir = tempdir().expect("tempdir");
    let store = Arc::new(SnapshotStore::new(dir.path().join("orchestrator-jobs.json")));
    let adapter = FixtureRuntimeProfileAdapter::new();
    let progress = Arc::new(RecordingProgressSink::default());
    let queue = OrchestratorQueue::with_progress_sink(
        Arc::new(registry),
        store,
        adapter,
        progress.clone() as Arc<dyn ProgressSink>,
        SystemClock,
        QueueConfig::default(),
    );
    queue.start().await.expect("start");

    let enqueued = queue.enqueue(EnqueueInput::new("echo", "proj-a", json!({"n": 1}))).await.expect("enqueue");
    let terminal = queue.wait_for_terminal(&enqueued.job.id, Duration::from_secs(5)).await.expect("terminal");
    assert_eq!(terminal.state, JobState::Completed);

    assert_eq!(*queued_log.lock(), vec![enqueued.job.id.clone()]);
    assert_eq!(*started_log.lock(), vec![enqueued.job.id.clone()]);
    assert_eq!(*completed_log.lock(), vec![enqueued.job.id.clone()]);
    assert!(progress.events.lock().contains(&(enqueued.job.id.clone(), "job_completed".to_string())));
}

/// A job that exhausts its retries fans out `job_failed` and fires
/// `on_failed`, not `on_completed`.
#[tokio::test]
async fn exhausted_retries_fans_out_job_failed_and_fires_on_failed() {
    struct AlwaysFails;
    #[async_trait]
    impl JobRunner for AlwaysFails {
        async fn run(&self, _ctx: JobRunContext, _payload: Value) -> Result<Value, JobRunError> {
            Err(JobRunError::new("boom"))
        }
    }

    let failed_log = Arc::new(SyncMutex::new(Vec::new()));
    let failed_log2 = failed_log.clone();
    let mut registry = DefinitionRegistry::new();
    registry.register(
        JobDefinition::builder("always-fails", Arc::new(AlwaysFails))
            .max_attempts(1)
            .on_failed(move |job| {
                failed_log2.lock().push(job.id.clone());
                Ok(())
            })
            .build(),
    );

    let dir = tempdir().expect("tempdir");
    let store = Arc::new(SnapshotStore::new(dir.path().join("orchestrator-jobs.json")));
    let adapter = FixtureRuntimeProfileAdapter::new();
    let progress = Arc::new(RecordingProgressSink::default());
    let queue = OrchestratorQueue::with_progress_sink(
        Arc::new(registry),
        store,
        adapter,
        progress.clone() as Arc<dyn ProgressSink>,
        SystemClock,
        QueueConfig::default(),
    );
    queue.start().await.expect("start");

    let enqueued = queue.enqueue(EnqueueInput::new("always-fails", "proj-a", json!({}))).await.expect("enqueue");
    let terminal = queue.wait_for_terminal(&enqueued.job.id, Duration::from_secs(5)).await.expect("terminal");
    assert_eq!(terminal.state, JobState::Failed);

    assert_eq!(*failed_log.lock(), vec![enqueued.job.id.clone()]);
    assert!(progress.events.lock().contains(&(enqueued.job.id.clone(), "job_failed".to_string())));
}
