// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Action Executor: the safety-critical layer between handler-returned
//! action requests and privileged side effects. Capability gating already
//! happened in the events runtime before `execute` is ever called here —
//! this layer owns envelope validation, idempotency replay, scope
//! enforcement, dispatch, and cache write-back.

use crate::cache::{signature_of, IdempotencyCache, ReplayOutcome};
use crate::fields;
use crate::scope_check;
use async_trait::async_trait;
use conductor_adapters::RuntimeProfileAdapter;
use conductor_core::{ActionEnvelope, ActionResult, ActionResultDetails, ActionScope, ActionStatus, ActionType, EnqueueStatus};
use conductor_events::{ActionExecutorHandle, EnqueueHandle};
use conductor_orchestrator::EnqueueInput;
use std::str::FromStr;
use std::sync::Arc;

/// Capacity SPEC_FULL.md gives for the idempotency cache.
pub const DEFAULT_CACHE_CAPACITY: usize = 5_000;

pub struct ActionExecutor {
    adapter: Arc<dyn RuntimeProfileAdapter>,
    enqueue: Arc<dyn EnqueueHandle>,
    cache: IdempotencyCache,
}

impl ActionExecutor {
    pub fn new(adapter: Arc<dyn RuntimeProfileAdapter>, enqueue: Arc<dyn EnqueueHandle>) -> Self {
        Self::with_cache_capacity(adapter, enqueue, DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_cache_capacity(adapter: Arc<dyn RuntimeProfileAdapter>, enqueue: Arc<dyn EnqueueHandle>, cache_capacity: usize) -> Self {
        Self { adapter, enqueue, cache: IdempotencyCache::new(cache_capacity) }
    }

    async fn dispatch(&self, action_type: ActionType, envelope: &ActionEnvelope, scope: &ActionScope) -> ActionResult {
        match action_type {
            ActionType::TranscriptUpsert => {
                let Some(parsed) = fields::transcript_upsert(&envelope.payload) else {
                    return invalid(envelope, "malformed_payload");
                };
                if let Err(code) = scope_check::transcript_upsert(&parsed, scope) {
                    return forbidden(envelope, code);
                }
                let outcome = self.adapter.upsert_transcript(&parsed.session_id, &parsed.turn_id, parsed.entry).await;
                from_adapter_outcome(envelope, outcome.status, outcome.details)
            }
            ActionType::ApprovalDecide => {
                let Some(parsed) = fields::approval_decide(&envelope.payload) else {
                    return invalid(envelope, "malformed_payload");
                };
                if let Err(code) = scope_check::approval_decide(&parsed, scope) {
                    return forbidden(envelope, code);
                }
                let outcome = self.adapter.decide_approval(&parsed.thread_id, &parsed.turn_id, parsed.decision).await;
                from_adapter_outcome(envelope, outcome.status, outcome.details)
            }
            ActionType::TurnSteerCreate => {
                let Some(parsed) = fields::turn_steer_create(&envelope.payload) else {
                    return invalid(envelope, "malformed_payload");
                };
                if let Err(code) = scope_check::turn_steer_create(&parsed, scope) {
                    return forbidden(envelope, code);
                }
                let outcome = self.adapter.steer_turn(&parsed.session_id, &parsed.turn_id, parsed.instruction).await;
                from_adapter_outcome(envelope, outcome.status, outcome.details)
            }
            ActionType::QueueEnqueue => {
                let Some(parsed) = fields::queue_enqueue(&envelope.payload) else {
                    return invalid(envelope, "malformed_payload");
                };
                if let Err(code) = scope_check::queue_enqueue(&parsed, scope) {
                    return forbidden(envelope, code);
                }
                let mut input = EnqueueInput::new(parsed.job_type, parsed.project_id, parsed.payload);
                if let Some(source_session_id) = parsed.source_session_id {
                    input = input.source_session_id(source_session_id);
                }
                if let Some(priority) = parsed.priority {
                    input = input.priority(priority);
                }
                if let Some(dedupe_key) = parsed.dedupe_key {
                    input = input.dedupe_key(dedupe_key);
                }
                match self.enqueue.enqueue(input).await {
                    Ok(outcome) => {
                        let code = match outcome.status {
                            EnqueueStatus::Enqueued => None,
                            EnqueueStatus::AlreadyQueued => Some("job_already_queued"),
                        };
                        let status =
                            if code.is_some() { ActionStatus::AlreadyResolved } else { ActionStatus::Performed };
                        let mut details = code.map(ActionResultDetails::code).unwrap_or_default();
                        details.extra = serde_json::json!({"jobId": outcome.job.id.to_string()});
                        ActionResult::new(action_type.to_string(), status).with_envelope_ids(envelope).with_details(details)
                    }
                    Err(err) => ActionResult::new(action_type.to_string(), ActionStatus::Failed)
                        .with_envelope_ids(envelope)
                        .with_details(ActionResultDetails::code_message("queue_enqueue_failed", err.to_string())),
                }
            }
        }
    }
}

#[async_trait]
impl ActionExecutorHandle for ActionExecutor {
    async fn execute(&self, envelope: ActionEnvelope, scope: ActionScope) -> ActionResult {
        // Step 1: envelope validation.
        let Ok(action_type) = ActionType::from_str(&envelope.action_type) else {
            return invalid(&envelope, "unknown_action_type");
        };
        if !envelope.payload.is_object() {
            return invalid(&envelope, "malformed_payload");
        }

        // Step 2: capability gating happened in the events runtime before
        // this call was ever made (see conductor_events::runtime::reconcile_action).

        // Step 3: idempotency replay.
        let signature = signature_of(action_type.as_wire(), &envelope.payload, &scope);
        if let Some(idempotency_key) = envelope.idempotency_key.clone() {
            match self.cache.get(&idempotency_key, signature) {
                Some(ReplayOutcome::Hit(mut cached)) => {
                    cached.request_id = envelope.request_id.clone();
                    cached.idempotency_key = Some(idempotency_key);
                    return cached;
                }
                Some(ReplayOutcome::SignatureConflict) => {
                    return ActionResult::new(action_type.to_string(), ActionStatus::Conflict)
                        .with_envelope_ids(&envelope)
                        .with_details(ActionResultDetails::code("idempotency_conflict"));
                }
                None => {}
            }
        }

        let result = self.dispatch(action_type, &envelope, &scope).await;

        // Step 7: cache write-back, restricted to replay-cacheable statuses.
        if let Some(idempotency_key) = envelope.idempotency_key {
            if result.status.is_replay_cacheable() {
                self.cache.insert(idempotency_key, signature, result.clone());
            }
        }
        result
    }
}

fn invalid(envelope: &ActionEnvelope, code: &'static str) -> ActionResult {
    ActionResult::new(envelope.action_type.clone(), ActionStatus::Invalid)
        .with_envelope_ids(envelope)
        .with_details(ActionResultDetails::code(code))
}

fn forbidden(envelope: &ActionEnvelope, code: &'static str) -> ActionResult {
    ActionResult::new(envelope.action_type.clone(), ActionStatus::Forbidden)
        .with_envelope_ids(envelope)
        .with_details(ActionResultDetails::code(code))
}

fn from_adapter_outcome(envelope: &ActionEnvelope, status: ActionStatus, details: ActionResultDetails) -> ActionResult {
    ActionResult::new(envelope.action_type.clone(), status).with_envelope_ids(envelope).with_details(details)
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
