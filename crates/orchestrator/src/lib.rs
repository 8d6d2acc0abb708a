// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! conductor-orchestrator: the Orchestrator Queue. A per-process job
//! scheduler with project-scoped concurrency, priority + aging,
//! deduplication, retry with classification, timeout-driven cancellation,
//! interruption of in-flight agent turns, crash recovery, and durable
//! snapshotting.

pub mod definition;
pub mod error;
mod queue;
mod scheduler;

pub use definition::{
    DefinitionRegistry, JobDefinition, JobDefinitionBuilder, JobRunContext, JobRunError, JobRunner, NoopProgressSink,
    ProgressSink,
};
pub use error::QueueError;
pub use queue::{CancelOutcome, CancelStatus, EnqueueInput, EnqueueOutcome, OrchestratorQueue, QueueConfig};
