// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! conductor-core: shared data model for the orchestrator queue, agent
//! events runtime, and action executor.

pub mod macros;

pub mod action;
pub mod clock;
pub mod event;
pub mod id;
pub mod job;
pub mod module;
pub mod scope;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use action::{ActionEnvelope, ActionResult, ActionResultDetails, ActionStatus, ActionType, UnknownActionType};
pub use clock::{Clock, FakeClock, SystemClock};
pub use event::{DispatchResult, EnqueueStatus, EventEnvelope, HandlerOutput, JobSummary};
pub use id::{short, IdBuf};
#[cfg(any(test, feature = "test-support"))]
pub use job::JobBuilder;
pub use job::{CancelStrategy, DedupeMode, Job, JobId, JobState, Priority, RetryClassification, RunningContext};
pub use module::{
    ExtensionManifest, ManifestLoadOutcome, ManifestLoadRecord, ModuleCapabilities, ModuleOrigin, ModuleRecord,
    RegisteredHandler, RuntimeProfileRequirement, SnapshotVersion, TrustMode, TrustStatus, DEFAULT_HANDLER_PRIORITY,
    DEFAULT_HANDLER_TIMEOUT_MS,
};
pub use scope::ActionScope;
