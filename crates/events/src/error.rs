// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use conductor_core::ManifestLoadRecord;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("reload already in progress")]
    ReloadInProgress,
    #[error("reload failed: {} module error(s)", .records.iter().filter(|r| r.outcome != conductor_core::ManifestLoadOutcome::Loaded).count())]
    ReloadFailed { records: Vec<ManifestLoadRecord> },
}
