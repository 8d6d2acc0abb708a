// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The handler contract a module registers against one event type.
//!
//! Grounded on the same run(ctx, payload) shape `conductor-orchestrator`
//! uses for job runners: a handler is a suspendable async task with no
//! visibility into the runtime's internals beyond the event it was handed.

use async_trait::async_trait;
use conductor_core::{EventEnvelope, HandlerOutput};

/// One registered handler body. `HandlerOutput` is a closed sum type, so a
/// handler cannot construct the "looks like a direct action result" shape
/// the distilled design calls out — that case is unrepresentable here
/// rather than rejected at runtime.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: &EventEnvelope) -> HandlerOutput;
}

/// A module's registration callback, generalizing `registerAgentEvents`.
/// Modules are compiled into the process (see `ModuleFactory` docs); there
/// is no dynamic code loading.
pub trait ModuleFactory: Send + Sync {
    fn register(&self, registry: &mut crate::registry::EventRegistry<'_>);
}
