// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Runtime Profile Adapter: the narrow, stable interface the core
//! consumes to talk to the underlying coding-assistant runtime. Grounded on
//! this lineage's `SessionAdapter`/`AgentAdapter` pluggable-adapter pattern —
//! generalized here to one trait covering turn lifecycle and the three
//! privileged actions the executor may dispatch to it.

use async_trait::async_trait;
use conductor_core::{ActionResultDetails, ActionStatus};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("thread not found: {0}")]
    ThreadNotFound(String),
    #[error("no active turn for thread {0}")]
    NoActiveTurn(String),
    #[error("adapter transport error: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdapterIdentity {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnHandle {
    pub thread_id: String,
    pub turn_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadSnapshot {
    pub thread_id: String,
    pub items: Vec<serde_json::Value>,
}

/// Outcome of a privileged action dispatched through the adapter. A subset
/// of [`ActionStatus`] — `invalid` and `forbidden` are executor-only
/// verdicts decided before the adapter is ever called.
#[derive(Debug, Clone)]
pub struct AdapterOutcome {
    pub status: ActionStatus,
    pub details: ActionResultDetails,
}

impl AdapterOutcome {
    pub fn performed() -> Self {
        Self { status: ActionStatus::Performed, details: ActionResultDetails::default() }
    }

    pub fn already_resolved(code: impl Into<String>) -> Self {
        Self { status: ActionStatus::AlreadyResolved, details: ActionResultDetails::code(code) }
    }

    pub fn conflict(code: impl Into<String>) -> Self {
        Self { status: ActionStatus::Conflict, details: ActionResultDetails::code(code) }
    }

    pub fn failed(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self { status: ActionStatus::Failed, details: ActionResultDetails::code_message(code, message) }
    }
}

/// The stable surface the core depends on. A real implementation maps
/// these calls onto the assistant runtime's RPC surface (turn/start,
/// turn/interrupt, thread/read, ...); that mapping is outside this crate's
/// scope (see SPEC_FULL.md Non-goals) — only the interface and a fixture
/// implementation live here.
#[async_trait]
pub trait RuntimeProfileAdapter: Send + Sync {
    fn identity(&self) -> AdapterIdentity;

    async fn start_turn(&self, thread_id: &str, input: serde_json::Value) -> Result<TurnHandle, AdapterError>;

    async fn read_thread(&self, thread_id: &str) -> Result<ThreadSnapshot, AdapterError>;

    async fn interrupt_turn(&self, thread_id: &str, turn_id: &str) -> Result<(), AdapterError>;

    async fn upsert_transcript(&self, session_id: &str, turn_id: &str, entry: serde_json::Value) -> AdapterOutcome;

    async fn decide_approval(&self, thread_id: &str, turn_id: &str, decision: serde_json::Value) -> AdapterOutcome;

    async fn steer_turn(&self, session_id: &str, turn_id: &str, instruction: serde_json::Value) -> AdapterOutcome;
}

/// In-memory fixture used both by the daemon's default wiring (no external
/// assistant runtime is in scope for this crate) and by integration tests
/// that exercise the executor and events runtime end to end.
#[derive(Default)]
pub struct FixtureRuntimeProfileAdapter {
    turns: Mutex<HashMap<String, TurnHandle>>,
    interrupted: Mutex<Vec<(String, String)>>,
    transcripts: Mutex<HashMap<(String, String), Vec<serde_json::Value>>>,
    approvals: Mutex<HashMap<(String, String), serde_json::Value>>,
    steers: Mutex<Vec<(String, String, serde_json::Value)>>,
}

impl FixtureRuntimeProfileAdapter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn seed_turn(&self, thread_id: &str, turn_id: &str) {
        self.turns
            .lock()
            .insert(thread_id.to_string(), TurnHandle { thread_id: thread_id.to_string(), turn_id: turn_id.to_string() });
    }

    pub fn interrupted_turns(&self) -> Vec<(String, String)> {
        self.interrupted.lock().clone()
    }

    pub fn transcript_entries(&self, session_id: &str, turn_id: &str) -> Vec<serde_json::Value> {
        self.transcripts.lock().get(&(session_id.to_string(), turn_id.to_string())).cloned().unwrap_or_default()
    }

    pub fn steer_calls(&self) -> Vec<(String, String, serde_json::Value)> {
        self.steers.lock().clone()
    }
}

#[async_trait]
impl RuntimeProfileAdapter for FixtureRuntimeProfileAdapter {
    fn identity(&self) -> AdapterIdentity {
        AdapterIdentity { name: "fixture-runtime-profile".into(), version: "1.0.0".into() }
    }

    async fn start_turn(&self, thread_id: &str, _input: serde_json::Value) -> Result<TurnHandle, AdapterError> {
        let turn_seq = self.turns.lock().len();
        let handle = TurnHandle { thread_id: thread_id.to_string(), turn_id: format!("turn-{turn_seq}") };
        self.turns.lock().insert(thread_id.to_string(), handle.clone());
        Ok(handle)
    }

    async fn read_thread(&self, thread_id: &str) -> Result<ThreadSnapshot, AdapterError> {
        if !self.turns.lock().contains_key(thread_id) {
            return Err(AdapterError::ThreadNotFound(thread_id.to_string()));
        }
        Ok(ThreadSnapshot { thread_id: thread_id.to_string(), items: Vec::new() })
    }

    async fn interrupt_turn(&self, thread_id: &str, turn_id: &str) -> Result<(), AdapterError> {
        self.interrupted.lock().push((thread_id.to_string(), turn_id.to_string()));
        Ok(())
    }

    async fn upsert_transcript(&self, session_id: &str, turn_id: &str, entry: serde_json::Value) -> AdapterOutcome {
        self.transcripts.lock().entry((session_id.to_string(), turn_id.to_string())).or_default().push(entry);
        AdapterOutcome::performed()
    }

    async fn decide_approval(&self, thread_id: &str, turn_id: &str, decision: serde_json::Value) -> AdapterOutcome {
        let key = (thread_id.to_string(), turn_id.to_string());
        let mut approvals = self.approvals.lock();
        if approvals.contains_key(&key) {
            return AdapterOutcome::already_resolved("approval_already_decided");
        }
        approvals.insert(key, decision);
        AdapterOutcome::performed()
    }

    async fn steer_turn(&self, session_id: &str, turn_id: &str, instruction: serde_json::Value) -> AdapterOutcome {
        self.steers.lock().push((session_id.to_string(), turn_id.to_string(), instruction));
        AdapterOutcome::performed()
    }
}

#[cfg(test)]
#[path = "runtime_profile_tests.rs"]
mod tests;
