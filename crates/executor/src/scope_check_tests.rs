use super::*;
use crate::fields::{QueueEnqueueFields, TranscriptUpsertFields};
use serde_json::json;

fn scope() -> ActionScope {
    ActionScope::new().source_session_id("s1").turn_id("t1").project_id("proj-a")
}

#[test]
fn transcript_upsert_matches_scope() {
    let fields = TranscriptUpsertFields { session_id: "s1".into(), turn_id: "t1".into(), entry: json!({}) };
    assert!(transcript_upsert(&fields, &scope()).is_ok());
}

#[test]
fn transcript_upsert_session_mismatch() {
    let fields = TranscriptUpsertFields { session_id: "other".into(), turn_id: "t1".into(), entry: json!({}) };
    assert_eq!(transcript_upsert(&fields, &scope()), Err(SCOPE_SESSION_MISMATCH));
}

#[test]
fn transcript_upsert_turn_mismatch() {
    let fields = TranscriptUpsertFields { session_id: "s1".into(), turn_id: "other".into(), entry: json!({}) };
    assert_eq!(transcript_upsert(&fields, &scope()), Err(SCOPE_TURN_MISMATCH));
}

#[test]
fn queue_enqueue_project_mismatch() {
    let fields = QueueEnqueueFields {
        project_id: "other".into(),
        job_type: "t".into(),
        payload: json!({}),
        source_session_id: None,
        priority: None,
        dedupe_key: None,
    };
    assert_eq!(queue_enqueue(&fields, &scope()), Err(SCOPE_PROJECT_MISMATCH));
}

#[test]
fn queue_enqueue_source_session_check_skipped_when_scope_has_none() {
    let fields = QueueEnqueueFields {
        project_id: "proj-a".into(),
        job_type: "t".into(),
        payload: json!({}),
        source_session_id: Some("whatever".into()),
        priority: None,
        dedupe_key: None,
    };
    let scope = ActionScope::new().project_id("proj-a");
    assert!(queue_enqueue(&fields, &scope).is_ok());
}

#[test]
fn queue_enqueue_source_session_mismatch_when_scope_has_one() {
    let fields = QueueEnqueueFields {
        project_id: "proj-a".into(),
        job_type: "t".into(),
        payload: json!({}),
        source_session_id: Some("other".into()),
        priority: None,
        dedupe_key: None,
    };
    assert_eq!(queue_enqueue(&fields, &scope()), Err(SCOPE_SESSION_MISMATCH));
}
