// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session metadata collaborator: titles, projects, approval policies. The
//! core consumes this as a read/write key-value document; the on-disk (or
//! remote) format is the concrete adapter's concern (see SPEC_FULL.md §6).

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: String,
    pub project_id: String,
    pub title: Option<String>,
    pub approval_policy: Option<String>,
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, session_id: &str) -> Option<SessionRecord>;
    async fn upsert(&self, record: SessionRecord);
}

#[derive(Default)]
pub struct InMemorySessionStore {
    records: Mutex<HashMap<String, SessionRecord>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, session_id: &str) -> Option<SessionRecord> {
        self.records.lock().get(session_id).cloned()
    }

    async fn upsert(&self, record: SessionRecord) {
        self.records.lock().insert(record.session_id.clone(), record);
    }
}

#[cfg(test)]
#[path = "session_store_tests.rs"]
mod tests;
