use super::*;

#[test]
fn fresh_queued_job_upholds_invariants() {
    let job = Job::builder().build();
    assert!(job.upholds_invariants());
    assert_eq!(job.state, JobState::Queued);
    assert!(job.running_context.is_none());
}

#[test]
fn running_job_without_context_violates_invariant() {
    let job = Job::builder().state(JobState::Running).build();
    assert!(!job.upholds_invariants());
}

#[test]
fn running_job_with_context_upholds_invariant() {
    let job = Job::builder()
        .state(JobState::Running)
        .running_context(RunningContext { thread_id: "t-1".into(), turn_id: "tn-1".into() })
        .build();
    assert!(job.upholds_invariants());
}

#[test]
fn terminal_job_requires_completed_at() {
    let job = Job::builder().state(JobState::Completed).build();
    assert!(!job.upholds_invariants());

    let job = Job::builder().state(JobState::Completed).completed_at(Utc::now()).build();
    assert!(job.upholds_invariants());
}

#[test]
fn attempts_beyond_max_violates_invariant() {
    let job = Job::builder().attempts(3).max_attempts(2).build();
    assert!(!job.upholds_invariants());
}

#[test]
fn job_state_terminal_classification() {
    assert!(JobState::Completed.is_terminal());
    assert!(JobState::Failed.is_terminal());
    assert!(JobState::Canceled.is_terminal());
    assert!(JobState::Quarantined.is_terminal());
    assert!(!JobState::Queued.is_terminal());
    assert!(!JobState::Running.is_terminal());
}

#[test]
fn dedupe_mode_display_matches_wire_strings() {
    assert_eq!(DedupeMode::SingleFlight.to_string(), "single_flight");
    assert_eq!(DedupeMode::DropDuplicate.to_string(), "drop_duplicate");
    assert_eq!(DedupeMode::MergeDuplicate.to_string(), "merge_duplicate");
    assert_eq!(DedupeMode::None.to_string(), "none");
}
