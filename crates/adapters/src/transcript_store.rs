// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Supplemental transcript store: an append/update log the core writes
//! through when an action is dispatched via `transcript.upsert`.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

#[async_trait]
pub trait TranscriptStore: Send + Sync {
    async fn upsert_entry(&self, session_id: &str, turn_id: &str, entry: serde_json::Value);
    async fn entries(&self, session_id: &str, turn_id: &str) -> Vec<serde_json::Value>;
}

#[derive(Default)]
pub struct InMemoryTranscriptStore {
    entries: Mutex<HashMap<(String, String), Vec<serde_json::Value>>>,
}

impl InMemoryTranscriptStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TranscriptStore for InMemoryTranscriptStore {
    async fn upsert_entry(&self, session_id: &str, turn_id: &str, entry: serde_json::Value) {
        self.entries.lock().entry((session_id.to_string(), turn_id.to_string())).or_default().push(entry);
    }

    async fn entries(&self, session_id: &str, turn_id: &str) -> Vec<serde_json::Value> {
        self.entries.lock().get(&(session_id.to_string(), turn_id.to_string())).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
#[path = "transcript_store_tests.rs"]
mod tests;
