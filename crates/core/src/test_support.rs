// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test-only fixtures shared across crates (enabled via `test-support`).

use crate::clock::FakeClock;
use crate::job::{Job, JobState, Priority};
use chrono::Utc;

/// A `FakeClock` pinned to a fixed, human-legible epoch for reproducible
/// golden-value assertions.
pub fn fixed_clock() -> FakeClock {
    let clock = FakeClock::new();
    clock.set_epoch_ms(1_700_000_000_000);
    clock
}

/// A queued job with deterministic defaults, for tests that only care
/// about scheduling behavior and not payload contents.
pub fn queued_job(project_id: &str, job_type: &str) -> Job {
    Job::builder().project_id(project_id).job_type(job_type).state(JobState::Queued).priority(Priority::Background).build()
}

pub fn interactive_job(project_id: &str, job_type: &str) -> Job {
    Job::builder().project_id(project_id).job_type(job_type).state(JobState::Queued).priority(Priority::Interactive).build()
}

pub fn running_job(project_id: &str, job_type: &str, thread_id: &str, turn_id: &str) -> Job {
    Job::builder()
        .project_id(project_id)
        .job_type(job_type)
        .state(JobState::Running)
        .started_at(Utc::now())
        .running_context(crate::job::RunningContext { thread_id: thread_id.into(), turn_id: turn_id.into() })
        .build()
}
