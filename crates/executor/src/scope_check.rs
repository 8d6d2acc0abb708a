// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Step 4 of action execution: verify the identifiers a handler's payload
//! carries match the scope the originating event was raised under. A
//! mismatch is `forbidden`, not `invalid` — the payload is well-formed, it
//! just isn't for this caller.

use crate::fields::{ApprovalDecideFields, QueueEnqueueFields, TranscriptUpsertFields, TurnSteerFields};
use conductor_core::ActionScope;

pub const SCOPE_SESSION_MISMATCH: &str = "scope_session_mismatch";
pub const SCOPE_TURN_MISMATCH: &str = "scope_turn_mismatch";
pub const SCOPE_PROJECT_MISMATCH: &str = "scope_project_mismatch";

pub fn transcript_upsert(fields: &TranscriptUpsertFields, scope: &ActionScope) -> Result<(), &'static str> {
    if scope.source_session_id.as_deref() != Some(fields.session_id.as_str()) {
        return Err(SCOPE_SESSION_MISMATCH);
    }
    if scope.turn_id.as_deref() != Some(fields.turn_id.as_str()) {
        return Err(SCOPE_TURN_MISMATCH);
    }
    Ok(())
}

pub fn approval_decide(fields: &ApprovalDecideFields, scope: &ActionScope) -> Result<(), &'static str> {
    if scope.source_session_id.as_deref() != Some(fields.thread_id.as_str()) {
        return Err(SCOPE_SESSION_MISMATCH);
    }
    if scope.turn_id.as_deref() != Some(fields.turn_id.as_str()) {
        return Err(SCOPE_TURN_MISMATCH);
    }
    Ok(())
}

pub fn turn_steer_create(fields: &TurnSteerFields, scope: &ActionScope) -> Result<(), &'static str> {
    if scope.source_session_id.as_deref() != Some(fields.session_id.as_str()) {
        return Err(SCOPE_SESSION_MISMATCH);
    }
    if scope.turn_id.as_deref() != Some(fields.turn_id.as_str()) {
        return Err(SCOPE_TURN_MISMATCH);
    }
    Ok(())
}

pub fn queue_enqueue(fields: &QueueEnqueueFields, scope: &ActionScope) -> Result<(), &'static str> {
    if scope.project_id.as_deref() != Some(fields.project_id.as_str()) {
        return Err(SCOPE_PROJECT_MISMATCH);
    }
    if let Some(source_session_id) = scope.source_session_id.as_deref() {
        if fields.source_session_id.as_deref() != Some(source_session_id) {
            return Err(SCOPE_SESSION_MISMATCH);
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "scope_check_tests.rs"]
mod tests;
