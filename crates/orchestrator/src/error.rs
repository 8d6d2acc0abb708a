// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Public error type for the orchestrator queue. `Enqueue` is the only
//! operation that returns a typed error; every other queue operation
//! answers with a status enum instead (see [`crate::queue`]).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("invalid payload: {message}")]
    InvalidPayload { message: String },
    #[error("queue is full")]
    QueueFull,
    #[error("unknown job type: {0}")]
    UnknownJobType(String),
    #[error("snapshot error: {0}")]
    Snapshot(#[from] conductor_storage::SnapshotError),
}
