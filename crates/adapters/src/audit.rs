// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Extension audit collaborator: records every manifest-evaluation attempt,
//! not just the modules that made it into a snapshot, so operators can see
//! *why* a candidate was rejected.

use conductor_core::ManifestLoadRecord;
use parking_lot::Mutex;

pub trait ExtensionAuditSink: Send + Sync {
    fn record(&self, record: ManifestLoadRecord);
    fn all(&self) -> Vec<ManifestLoadRecord>;
}

#[derive(Default)]
pub struct InMemoryAuditSink {
    records: Mutex<Vec<ManifestLoadRecord>>,
}

impl InMemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ExtensionAuditSink for InMemoryAuditSink {
    fn record(&self, record: ManifestLoadRecord) {
        self.records.lock().push(record);
    }

    fn all(&self) -> Vec<ManifestLoadRecord> {
        self.records.lock().clone()
    }
}

#[cfg(test)]
#[path = "audit_tests.rs"]
mod tests;
