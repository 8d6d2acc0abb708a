// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Trust policy: what happens when a module registers a handler for an
//! event type it did not declare in `capabilities.events`.

use crate::registry::StagedHandler;
use conductor_core::{ModuleCapabilities, TrustMode, TrustStatus};

pub fn evaluate(mode: TrustMode, capabilities: &ModuleCapabilities, staged: &[StagedHandler]) -> (TrustStatus, Vec<String>) {
    let undeclared: Vec<&str> = staged
        .iter()
        .map(|s| s.registered.event_type.as_str())
        .filter(|event_type| !capabilities.declares_event(event_type))
        .collect();

    if undeclared.is_empty() {
        return (TrustStatus::Accepted, Vec::new());
    }

    match mode {
        TrustMode::Disabled => (TrustStatus::Accepted, Vec::new()),
        TrustMode::Warn => {
            let diagnostics = undeclared.iter().map(|e| format!("undeclared event capability: {e}")).collect();
            (TrustStatus::AcceptedWithWarnings, diagnostics)
        }
        TrustMode::Enforced => {
            let diagnostics = undeclared.iter().map(|e| format!("undeclared event capability: {e}")).collect();
            (TrustStatus::Denied, diagnostics)
        }
    }
}

#[cfg(test)]
#[path = "trust_tests.rs"]
mod tests;
