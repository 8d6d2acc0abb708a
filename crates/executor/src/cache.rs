// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded LRU of previously executed action results, keyed by idempotency
//! key. A request replaying a key with the same signature gets the cached
//! result back verbatim; a request reusing the key with a different
//! signature is a conflict, not a replay.

use conductor_core::{ActionResult, ActionScope};
use lru::LruCache;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;

#[derive(Clone)]
struct CacheEntry {
    signature: u64,
    result: ActionResult,
}

pub enum ReplayOutcome {
    Hit(ActionResult),
    SignatureConflict,
}

pub struct IdempotencyCache {
    entries: Mutex<LruCache<String, CacheEntry>>,
}

impl IdempotencyCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self { entries: Mutex::new(LruCache::new(capacity)) }
    }

    pub fn get(&self, key: &str, signature: u64) -> Option<ReplayOutcome> {
        let mut entries = self.entries.lock();
        let entry = entries.get(key)?;
        if entry.signature == signature {
            Some(ReplayOutcome::Hit(entry.result.clone()))
        } else {
            Some(ReplayOutcome::SignatureConflict)
        }
    }

    pub fn insert(&self, key: String, signature: u64, result: ActionResult) {
        self.entries.lock().put(key, CacheEntry { signature, result });
    }
}

/// Deterministic hash of `{action_type, payload, scope}`. `serde_json::Value`
/// maps are `BTreeMap`-backed without the `preserve_order` feature, so
/// `to_string` is already a canonical encoding independent of field order as
/// originally received.
pub fn signature_of(action_type: &str, payload: &Value, scope: &ActionScope) -> u64 {
    let mut hasher = DefaultHasher::new();
    action_type.hash(&mut hasher);
    payload.to_string().hash(&mut hasher);
    serde_json::to_string(scope).unwrap_or_default().hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
