// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The two collaborator seams `Emit` calls out to. Both are defined here,
//! not in the crates that satisfy them, so `conductor-events` never has to
//! depend on a concrete `Clock`-parameterized queue type or on the executor
//! crate — the composition root wires concrete implementations in.

use async_trait::async_trait;
use conductor_core::{ActionEnvelope, ActionResult, ActionScope, Clock};
use conductor_orchestrator::{EnqueueInput, EnqueueOutcome, OrchestratorQueue, QueueError};

/// Routes a handler's `EnqueueRequest` to the orchestrator queue. Blanket-
/// implemented for `OrchestratorQueue<C>` below so any clock parameterization
/// works without `conductor-events` naming it.
#[async_trait]
pub trait EnqueueHandle: Send + Sync {
    async fn enqueue(&self, input: EnqueueInput) -> Result<EnqueueOutcome, QueueError>;
}

#[async_trait]
impl<C: Clock + 'static> EnqueueHandle for OrchestratorQueue<C> {
    async fn enqueue(&self, input: EnqueueInput) -> Result<EnqueueOutcome, QueueError> {
        OrchestratorQueue::enqueue(self, input).await
    }
}

/// Executes a reconciled `ActionRequest`. Implemented by `conductor-executor`'s
/// `ActionExecutor` at the composition root; `Emit` treats its absence
/// (`None` passed in) as `action_executor_unavailable`. `scope` is the
/// originating event's scope, not anything carried on `envelope` — a handler
/// cannot forge it.
#[async_trait]
pub trait ActionExecutorHandle: Send + Sync {
    async fn execute(&self, envelope: ActionEnvelope, scope: ActionScope) -> ActionResult;
}
