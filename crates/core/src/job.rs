// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job identifier and state machine.
//!
//! A [`Job`] is the durable record the orchestrator queue schedules, runs,
//! retries, and persists. The scheduler itself lives in `conductor-orchestrator`;
//! this module only carries the data shapes shared across crates (core,
//! storage, events, executor all read or write `Job` records).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a queued job instance.
    #[derive(Default)]
    pub struct JobId("job-");
}

/// Priority class. Interactive jobs run ahead of background jobs unless
/// background aging promotes one past the interactive burst limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Interactive,
    Background,
}

crate::simple_display! {
    Priority {
        Interactive => "interactive",
        Background => "background",
    }
}

/// Job lifecycle state. `Queued -> Running -> {Completed, Failed, Canceled}`,
/// plus `Queued -> Canceled` and `Queued -> Queued` (retry). `Quarantined` is
/// reached only via crash recovery, when a recovered job's type has been
/// removed from the definitions registry between runs (see DESIGN.md).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Queued,
    Running,
    Completed,
    Failed,
    Canceled,
    Quarantined,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed | JobState::Canceled | JobState::Quarantined)
    }
}

crate::simple_display! {
    JobState {
        Queued => "queued",
        Running => "running",
        Completed => "completed",
        Failed => "failed",
        Canceled => "canceled",
        Quarantined => "quarantined",
    }
}

/// How concurrent enqueue requests for the same `(project, type, dedupe_key)`
/// are reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupeMode {
    None,
    SingleFlight,
    DropDuplicate,
    MergeDuplicate,
}

crate::simple_display! {
    DedupeMode {
        None => "none",
        SingleFlight => "single_flight",
        DropDuplicate => "drop_duplicate",
        MergeDuplicate => "merge_duplicate",
    }
}

/// Classification of a run failure, decided by the job definition's retry
/// classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryClassification {
    Retryable,
    Fatal,
}

/// How `Cancel` should be carried out for a running job of this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelStrategy {
    MarkCanceled,
    InterruptTurn,
}

crate::simple_display! {
    CancelStrategy {
        MarkCanceled => "mark_canceled",
        InterruptTurn => "interrupt_turn",
    }
}

/// Thread/turn the job is currently driving. Populated only while
/// `state == Running`; cleared on every terminal or requeue transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunningContext {
    pub thread_id: String,
    pub turn_id: String,
}

/// A job instance, as persisted in the orchestrator snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub job_type: String,
    pub schema_version: u32,
    pub project_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_session_id: Option<String>,
    pub priority: Priority,
    pub state: JobState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dedupe_key: Option<String>,
    pub payload: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub attempts: u32,
    pub max_attempts: u32,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_attempt_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancel_requested_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_attempt_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub running_context: Option<RunningContext>,
}

impl Job {
    /// Invariant check used by tests and by storage on load: a job that
    /// violates this is corrupt and should not be trusted by the scheduler.
    pub fn upholds_invariants(&self) -> bool {
        let attempts_ok = self.attempts <= self.max_attempts;
        let running_ctx_ok = (self.state == JobState::Running) == self.running_context.is_some();
        let completed_at_ok = self.state.is_terminal() == self.completed_at.is_some();
        attempts_ok && running_ctx_ok && completed_at_ok
    }

    pub fn is_running(&self) -> bool {
        self.state == JobState::Running
    }
}

crate::builder! {
    pub struct JobBuilder => Job {
        into {
            job_type: String = "test.job",
            project_id: String = "proj-test",
        }
        set {
            schema_version: u32 = 1,
            priority: Priority = Priority::Background,
            state: JobState = JobState::Queued,
            payload: serde_json::Value = serde_json::json!({}),
            attempts: u32 = 0,
            max_attempts: u32 = 2,
        }
        option {
            source_session_id: String = None,
            dedupe_key: String = None,
            result: serde_json::Value = None,
            error: String = None,
            started_at: DateTime<Utc> = None,
            completed_at: DateTime<Utc> = None,
            last_attempt_at: DateTime<Utc> = None,
            cancel_requested_at: DateTime<Utc> = None,
            next_attempt_at: DateTime<Utc> = None,
            running_context: RunningContext = None,
        }
        computed {
            id: JobId = JobId::new(),
            created_at: DateTime<Utc> = Utc::now(),
        }
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
