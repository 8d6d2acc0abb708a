// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Action request/result envelopes exchanged between the Agent Events
//! Runtime, the Action Executor, and the Runtime Profile Adapter.
//!
//! Modeled on the `Effect` name()/fields() pattern: every action carries a
//! stable name for span attributes and structured logging.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The known, validated action types the executor supports. Handlers submit
/// an [`ActionEnvelope`] with a free-form `action_type` string; the executor
/// parses it into one of these before dispatch and returns `invalid` for
/// anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    TranscriptUpsert,
    ApprovalDecide,
    TurnSteerCreate,
    QueueEnqueue,
}

impl ActionType {
    pub const ALL: [ActionType; 4] =
        [ActionType::TranscriptUpsert, ActionType::ApprovalDecide, ActionType::TurnSteerCreate, ActionType::QueueEnqueue];

    pub fn as_wire(self) -> &'static str {
        match self {
            ActionType::TranscriptUpsert => "transcript.upsert",
            ActionType::ApprovalDecide => "approval.decide",
            ActionType::TurnSteerCreate => "turn.steer.create",
            ActionType::QueueEnqueue => "queue.enqueue",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// Returned when a handler-supplied `action_type` string does not match any
/// known [`ActionType`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownActionType(pub String);

impl fmt::Display for UnknownActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown action type: {}", self.0)
    }
}

impl std::error::Error for UnknownActionType {}

impl std::str::FromStr for ActionType {
    type Err = UnknownActionType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActionType::ALL.into_iter().find(|a| a.as_wire() == s).ok_or_else(|| UnknownActionType(s.to_string()))
    }
}

/// An action request as returned by a handler. `action_type` is kept as a
/// raw string at this layer — only the executor's envelope validation step
/// parses it into a known [`ActionType`], so that an unrecognized type
/// produces a structured `invalid` result rather than a deserialization
/// failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionEnvelope {
    pub action_type: String,
    pub payload: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
}

impl ActionEnvelope {
    /// Name for log spans, e.g. "transcript.upsert" or the raw (invalid)
    /// string if it doesn't parse.
    pub fn name(&self) -> &str {
        &self.action_type
    }

    pub fn fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![("action_type", self.action_type.clone())];
        if let Some(id) = &self.request_id {
            fields.push(("request_id", id.clone()));
        }
        if let Some(key) = &self.idempotency_key {
            fields.push(("idempotency_key", key.clone()));
        }
        fields
    }
}

/// Final disposition of an executed (or rejected) action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    Performed,
    AlreadyResolved,
    NotEligible,
    Conflict,
    Forbidden,
    Invalid,
    Failed,
}

crate::simple_display! {
    ActionStatus {
        Performed => "performed",
        AlreadyResolved => "already_resolved",
        NotEligible => "not_eligible",
        Conflict => "conflict",
        Forbidden => "forbidden",
        Invalid => "invalid",
        Failed => "failed",
    }
}

impl ActionStatus {
    /// Statuses the idempotency cache is allowed to replay verbatim.
    pub fn is_replay_cacheable(self) -> bool {
        matches!(
            self,
            ActionStatus::Performed
                | ActionStatus::AlreadyResolved
                | ActionStatus::NotEligible
                | ActionStatus::Conflict
                | ActionStatus::Forbidden
                | ActionStatus::Invalid
        )
    }
}

/// Structured result detail: a machine-readable `code` plus any extra
/// context. `code` values used by the executor/runtime are documented in
/// SPEC_FULL.md (e.g. `undeclared_capability`, `action_winner_already_selected`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionResultDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub extra: serde_json::Value,
}

impl ActionResultDetails {
    pub fn code(code: impl Into<String>) -> Self {
        Self { code: Some(code.into()), message: None, extra: serde_json::Value::Null }
    }

    pub fn code_message(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self { code: Some(code.into()), message: Some(message.into()), extra: serde_json::Value::Null }
    }
}

/// Result of executing (or refusing to execute) an action envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResult {
    pub status: ActionStatus,
    pub action_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
    #[serde(default)]
    pub details: ActionResultDetails,
}

impl ActionResult {
    pub fn new(action_type: impl Into<String>, status: ActionStatus) -> Self {
        Self {
            status,
            action_type: action_type.into(),
            request_id: None,
            idempotency_key: None,
            details: ActionResultDetails::default(),
        }
    }

    pub fn with_details(mut self, details: ActionResultDetails) -> Self {
        self.details = details;
        self
    }

    pub fn with_envelope_ids(mut self, envelope: &ActionEnvelope) -> Self {
        self.request_id = envelope.request_id.clone();
        self.idempotency_key = envelope.idempotency_key.clone();
        self
    }

    pub fn is_performed(&self) -> bool {
        self.status == ActionStatus::Performed
    }
}

#[cfg(test)]
#[path = "action_tests.rs"]
mod tests;
