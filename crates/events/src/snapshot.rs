// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The immutable, read-copy-update snapshot: loaded modules, their
//! metadata, and the event -> sorted handler list it dispatches against.

use crate::handler::EventHandler;
use chrono::{DateTime, Utc};
use conductor_core::{ModuleRecord, RegisteredHandler, SnapshotVersion};
use indexmap::IndexMap;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct BoundHandler {
    pub registered: RegisteredHandler,
    pub handler: Arc<dyn EventHandler>,
}

/// One fully-built generation of loaded extension modules. Replaced
/// wholesale on every successful `Reload`; never mutated in place.
pub struct ModuleSnapshot {
    pub version: SnapshotVersion,
    pub loaded_at: DateTime<Utc>,
    pub modules: Vec<ModuleRecord>,
    pub(crate) handlers_by_event: IndexMap<String, Vec<BoundHandler>>,
}

impl ModuleSnapshot {
    pub fn empty(now: DateTime<Utc>) -> Self {
        Self { version: SnapshotVersion::new(), loaded_at: now, modules: Vec::new(), handlers_by_event: IndexMap::new() }
    }

    pub fn module_capabilities(&self, module_name: &str) -> Option<&conductor_core::ModuleCapabilities> {
        self.modules.iter().find(|m| m.name == module_name).map(|m| &m.capabilities)
    }
}
