// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! conductor-storage: durable snapshot persistence for the orchestrator
//! queue's job table.

pub mod snapshot;

pub use snapshot::{QueueSnapshot, SnapshotError, SnapshotStore, CURRENT_SNAPSHOT_VERSION};
