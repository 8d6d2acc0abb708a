// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pulls the identifiers each action type's payload is expected to carry.
//! Shared by scope enforcement and dispatch so a payload is only parsed
//! once. A field missing or of the wrong shape is treated as a malformed
//! payload (`invalid`), distinct from a well-formed payload whose
//! identifiers simply don't match the caller's scope (`forbidden`).

use conductor_core::Priority;
use serde_json::Value;

pub struct TranscriptUpsertFields {
    pub session_id: String,
    pub turn_id: String,
    pub entry: Value,
}

pub fn transcript_upsert(payload: &Value) -> Option<TranscriptUpsertFields> {
    let session_id = payload.get("sessionId")?.as_str()?.to_string();
    let entry = payload.get("entry")?.clone();
    let turn_id = entry.get("turnId")?.as_str()?.to_string();
    Some(TranscriptUpsertFields { session_id, turn_id, entry })
}

pub struct ApprovalDecideFields {
    pub thread_id: String,
    pub turn_id: String,
    pub decision: Value,
}

pub fn approval_decide(payload: &Value) -> Option<ApprovalDecideFields> {
    let thread_id = payload.get("threadId")?.as_str()?.to_string();
    let turn_id = payload.get("turnId")?.as_str()?.to_string();
    let decision = payload.get("decision")?.clone();
    Some(ApprovalDecideFields { thread_id, turn_id, decision })
}

pub struct TurnSteerFields {
    pub session_id: String,
    pub turn_id: String,
    pub instruction: Value,
}

pub fn turn_steer_create(payload: &Value) -> Option<TurnSteerFields> {
    let session_id = payload.get("sessionId")?.as_str()?.to_string();
    let turn_id = payload.get("turnId")?.as_str()?.to_string();
    let instruction = payload.get("instruction")?.clone();
    Some(TurnSteerFields { session_id, turn_id, instruction })
}

pub struct QueueEnqueueFields {
    pub project_id: String,
    pub job_type: String,
    pub payload: Value,
    pub source_session_id: Option<String>,
    pub priority: Option<Priority>,
    pub dedupe_key: Option<String>,
}

pub fn queue_enqueue(payload: &Value) -> Option<QueueEnqueueFields> {
    let project_id = payload.get("projectId")?.as_str()?.to_string();
    let job_type = payload.get("jobType")?.as_str()?.to_string();
    let inner_payload = payload.get("payload")?.clone();
    let source_session_id = payload.get("sourceSessionId").and_then(Value::as_str).map(str::to_string);
    let priority = match payload.get("priority").and_then(Value::as_str) {
        Some("interactive") => Some(Priority::Interactive),
        Some("background") => Some(Priority::Background),
        Some(_) => return None,
        None => None,
    };
    let dedupe_key = payload.get("dedupeKey").and_then(Value::as_str).map(str::to_string);
    Some(QueueEnqueueFields { project_id, job_type, payload: inner_payload, source_session_id, priority, dedupe_key })
}

#[cfg(test)]
#[path = "fields_tests.rs"]
mod tests;
