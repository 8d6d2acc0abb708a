// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Staging area a [`ModuleFactory`](crate::handler::ModuleFactory) writes
//! into during one module's registration pass, and the in-process factory
//! lookup table that stands in for dynamic entrypoint import.

use crate::handler::{EventHandler, ModuleFactory};
use conductor_core::{RegisteredHandler, DEFAULT_HANDLER_PRIORITY, DEFAULT_HANDLER_TIMEOUT_MS};
use std::collections::HashMap;
use std::sync::Arc;

/// One handler staged by a module's `register` call, paired with its
/// dispatch metadata.
pub struct StagedHandler {
    pub registered: RegisteredHandler,
    pub handler: Arc<dyn EventHandler>,
}

/// Handed to a [`ModuleFactory`] during its registration pass. `on` mirrors
/// the distilled design's `registry.on(eventType, handler, {priority?, timeoutMs?})`.
/// `registration_index` is a build-wide counter (not per-module), matching
/// the dispatch-order key's global tiebreak.
pub struct EventRegistry<'a> {
    module_name: &'a str,
    next_index: &'a mut u64,
    staged: Vec<StagedHandler>,
}

impl<'a> EventRegistry<'a> {
    pub(crate) fn new(module_name: &'a str, next_index: &'a mut u64) -> Self {
        Self { module_name, next_index, staged: Vec::new() }
    }

    pub fn on(&mut self, event_type: impl Into<String>, handler: Arc<dyn EventHandler>) -> HandlerOptions<'_, 'a> {
        let registration_index = *self.next_index;
        *self.next_index += 1;
        self.staged.push(StagedHandler {
            registered: RegisteredHandler {
                module_name: self.module_name.to_string(),
                event_type: event_type.into(),
                priority: DEFAULT_HANDLER_PRIORITY,
                registration_index,
                timeout_ms: DEFAULT_HANDLER_TIMEOUT_MS,
            },
            handler,
        });
        let last = self.staged.len() - 1;
        HandlerOptions { registry: self, index: last }
    }

    pub(crate) fn into_staged(self) -> Vec<StagedHandler> {
        self.staged
    }
}

/// Fluent tail of `on(...)`, letting a factory override priority/timeout
/// without forcing every call site to pass `None, None`.
pub struct HandlerOptions<'r, 'a> {
    registry: &'r mut EventRegistry<'a>,
    index: usize,
}

impl<'r, 'a> HandlerOptions<'r, 'a> {
    pub fn priority(self, priority: i32) -> Self {
        self.registry.staged[self.index].registered.priority = priority;
        self
    }

    pub fn timeout_ms(self, timeout_ms: u64) -> Self {
        self.registry.staged[self.index].registered.timeout_ms = timeout_ms;
        self
    }
}

/// Maps a manifest's resolved module name to the in-process factory that
/// builds its handlers. Stands in for dynamically importing the manifest's
/// `entrypoint` file: the composition root registers one factory per
/// extension it ships, keyed by the extension's manifest `name`.
#[derive(Default)]
pub struct FactoryRegistry {
    factories: HashMap<String, Arc<dyn ModuleFactory>>,
}

impl FactoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, module_name: impl Into<String>, factory: Arc<dyn ModuleFactory>) -> &mut Self {
        self.factories.insert(module_name.into(), factory);
        self
    }

    pub fn get(&self, module_name: &str) -> Option<Arc<dyn ModuleFactory>> {
        self.factories.get(module_name).cloned()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
