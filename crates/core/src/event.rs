// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event envelopes and the dispatch result sum type returned from one
//! `Emit` call. Mirrors the internal event-dispatch pattern this crate's
//! lineage uses for its own event enum, generalized to an open, externally
//! defined set of event types (extensions declare their own).

use crate::action::ActionResult;
use crate::job::{JobId, JobState};
use crate::scope::ActionScope;
use serde::{Deserialize, Serialize};

/// An inbound event. `event_type` is open-ended: well-known types are
/// documented in SPEC_FULL.md, but extensions may declare and emit their own.
///
/// `scope` is the authoritative session/turn/project context the event was
/// raised under. It rides along to any action a handler requests in
/// response, so the executor enforces it against the handler's own
/// (untrusted) payload rather than against anything the handler claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub event_type: String,
    pub payload: serde_json::Value,
    #[serde(default)]
    pub scope: ActionScope,
}

impl EventEnvelope {
    pub fn new(event_type: impl Into<String>, payload: serde_json::Value) -> Self {
        Self { event_type: event_type.into(), payload, scope: ActionScope::default() }
    }

    crate::setters! {
        set {
            scope: ActionScope,
        }
    }
}

/// Minimal job projection returned to event-runtime callers; avoids a
/// dependency from `conductor-events` back onto the full orchestrator crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSummary {
    pub id: JobId,
    pub job_type: String,
    pub project_id: String,
    pub state: JobState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnqueueStatus {
    Enqueued,
    AlreadyQueued,
}

crate::simple_display! {
    EnqueueStatus {
        Enqueued => "enqueued",
        AlreadyQueued => "already_queued",
    }
}

/// One handler's contribution to an `Emit` call's result list, tagged by
/// kind. Handlers may only ever *request* an enqueue or an action; the
/// runtime is the only thing that performs them — see `DispatchResult::ActionResult`,
/// which always carries an already-executed result, never a bare request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DispatchResult {
    EnqueueResult { module_name: String, status: EnqueueStatus, job: JobSummary },
    HandlerResult { module_name: String, details: serde_json::Value },
    ActionResult { module_name: String, result: ActionResult },
    HandlerError { module_name: String, event_type: String, message: String },
}

impl DispatchResult {
    pub fn module_name(&self) -> &str {
        match self {
            DispatchResult::EnqueueResult { module_name, .. } => module_name,
            DispatchResult::HandlerResult { module_name, .. } => module_name,
            DispatchResult::ActionResult { module_name, .. } => module_name,
            DispatchResult::HandlerError { module_name, .. } => module_name,
        }
    }

    /// True for an action result whose status is `performed` — the winner
    /// for the remainder of one `Emit` call.
    pub fn is_performed_action(&self) -> bool {
        matches!(self, DispatchResult::ActionResult { result, .. } if result.is_performed())
    }
}

/// What a handler function may return from `registerAgentEvents`'s `on(...)`
/// callback, before the runtime normalizes it into a [`DispatchResult`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HandlerOutput {
    /// Request that a job be enqueued; routed to the orchestrator queue.
    EnqueueRequest { job_type: String, project_id: String, payload: serde_json::Value },
    /// An opaque result bag with no further routing.
    HandlerResult { details: serde_json::Value },
    /// Request that an action be performed; routed to the action executor.
    ActionRequest(crate::action::ActionEnvelope),
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
