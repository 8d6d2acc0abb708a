use super::*;
use serde_json::json;

#[test]
fn transcript_upsert_extracts_session_and_nested_turn() {
    let payload = json!({"sessionId": "s1", "entry": {"turnId": "t1", "role": "assistant"}});
    let fields = transcript_upsert(&payload).expect("fields");
    assert_eq!(fields.session_id, "s1");
    assert_eq!(fields.turn_id, "t1");
}

#[test]
fn transcript_upsert_missing_entry_is_none() {
    let payload = json!({"sessionId": "s1"});
    assert!(transcript_upsert(&payload).is_none());
}

#[test]
fn queue_enqueue_parses_optional_fields() {
    let payload = json!({
        "projectId": "proj-a",
        "jobType": "t",
        "payload": {"x": 1},
        "sourceSessionId": "s1",
        "priority": "interactive",
        "dedupeKey": "dk",
    });
    let fields = queue_enqueue(&payload).expect("fields");
    assert_eq!(fields.project_id, "proj-a");
    assert_eq!(fields.job_type, "t");
    assert_eq!(fields.source_session_id.as_deref(), Some("s1"));
    assert!(matches!(fields.priority, Some(conductor_core::Priority::Interactive)));
    assert_eq!(fields.dedupe_key.as_deref(), Some("dk"));
}

#[test]
fn queue_enqueue_omits_absent_optional_fields() {
    let payload = json!({"projectId": "proj-a", "jobType": "t", "payload": {}});
    let fields = queue_enqueue(&payload).expect("fields");
    assert!(fields.source_session_id.is_none());
    assert!(fields.priority.is_none());
    assert!(fields.dedupe_key.is_none());
}

#[test]
fn queue_enqueue_rejects_unknown_priority_literal() {
    let payload = json!({"projectId": "proj-a", "jobType": "t", "payload": {}, "priority": "urgent"});
    assert!(queue_enqueue(&payload).is_none());
}
