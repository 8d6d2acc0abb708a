// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scope carried alongside an action request, used by the executor to
//! verify a handler is only acting on the session/turn/project it was
//! invoked for.

use serde::{Deserialize, Serialize};

/// Identifiers the action executor checks a payload against before
/// dispatching to the runtime profile adapter or the queue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionScope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turn_id: Option<String>,
}

impl ActionScope {
    pub fn new() -> Self {
        Self::default()
    }

    crate::setters! {
        option {
            project_id: String,
            source_session_id: String,
            turn_id: String,
        }
    }
}
