// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Extension module data shapes: manifests, trust, and the snapshot
//! inventory the Agent Events Runtime reports through `ListLoadedModules`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

crate::define_id! {
    /// Identifies one generation of a module snapshot. Opaque and
    /// unordered by design: callers compare it for equality (did the
    /// snapshot change?), never for relative recency.
    pub struct SnapshotVersion("snv-");
}

/// Where a candidate extension root came from. Ordering matters: lower
/// variants take precedence when two candidates resolve to the same path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleOrigin {
    RepoLocal,
    InstalledPackage,
    ConfiguredRoot,
}

crate::simple_display! {
    ModuleOrigin {
        RepoLocal => "repo_local",
        InstalledPackage => "installed_package",
        ConfiguredRoot => "configured_root",
    }
}

/// How strictly undeclared event/action usage is enforced against a
/// module's manifest capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustMode {
    Disabled,
    Warn,
    Enforced,
}

crate::simple_display! {
    TrustMode {
        Disabled => "disabled",
        Warn => "warn",
        Enforced => "enforced",
    }
}

impl std::str::FromStr for TrustMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "disabled" => Ok(TrustMode::Disabled),
            "warn" => Ok(TrustMode::Warn),
            "enforced" => Ok(TrustMode::Enforced),
            other => Err(format!("unknown trust mode: {other}")),
        }
    }
}

/// Result of loading a module against the active [`TrustMode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustStatus {
    Accepted,
    AcceptedWithWarnings,
    Denied,
}

crate::simple_display! {
    TrustStatus {
        Accepted => "accepted",
        AcceptedWithWarnings => "accepted_with_warnings",
        Denied => "denied",
    }
}

/// Declared event types and action types a module's manifest grants it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModuleCapabilities {
    #[serde(default)]
    pub events: Vec<String>,
    #[serde(default)]
    pub actions: Vec<String>,
}

impl ModuleCapabilities {
    pub fn declares_event(&self, event_type: &str) -> bool {
        self.events.iter().any(|e| e == event_type)
    }

    pub fn declares_action(&self, action_type: &str) -> bool {
        self.actions.iter().any(|a| a == action_type)
    }
}

/// A version range as declared in a manifest's `runtime` block. Kept as a
/// raw string at this layer; `conductor-events` parses it with `semver`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeProfileRequirement {
    pub name: String,
    pub version_range: String,
}

/// Parsed `extension.manifest.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtensionManifest {
    pub name: String,
    pub version: String,
    pub agent_id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub core_api_version_range: Option<String>,
    #[serde(default)]
    pub profiles: Vec<RuntimeProfileRequirement>,
    #[serde(default)]
    pub entrypoint: Option<String>,
    #[serde(default)]
    pub capabilities: ModuleCapabilities,
}

/// A handler registered by a module against one event type, with the
/// dispatch-ordering key `(priority, module_name, registration_index)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisteredHandler {
    pub module_name: String,
    pub event_type: String,
    pub priority: i32,
    pub registration_index: u64,
    pub timeout_ms: u64,
}

impl RegisteredHandler {
    /// The total dispatch order key. Handlers for an event type are sorted
    /// ascending by this tuple.
    pub fn order_key(&self) -> (i32, String, u64) {
        (self.priority, self.module_name.clone(), self.registration_index)
    }
}

pub const DEFAULT_HANDLER_PRIORITY: i32 = 100;
pub const DEFAULT_HANDLER_TIMEOUT_MS: u64 = 30_000;

/// A loaded module as reported in the active snapshot's inventory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleRecord {
    pub name: String,
    pub version: String,
    pub agent_id: String,
    pub display_name: Option<String>,
    pub origin: ModuleOrigin,
    pub path: PathBuf,
    pub entrypoint: PathBuf,
    pub capabilities: ModuleCapabilities,
    pub trust_status: TrustStatus,
    pub handler_count: usize,
}

/// Why a manifest-evaluation attempt did not result in an active module
/// (or did, as `Loaded`). Recorded for every candidate so `ListLoadedModules`
/// and audit tooling can explain rejections, not just report survivors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManifestLoadOutcome {
    Loaded,
    InvalidManifest,
    MissingEntrypoint,
    IncompatibleRuntime,
    AgentIdConflict,
    TrustDenied,
}

crate::simple_display! {
    ManifestLoadOutcome {
        Loaded => "loaded",
        InvalidManifest => "invalid_manifest",
        MissingEntrypoint => "missing_entrypoint",
        IncompatibleRuntime => "incompatible_runtime",
        AgentIdConflict => "agent_id_conflict",
        TrustDenied => "trust_denied",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestLoadRecord {
    pub module_dir: PathBuf,
    pub outcome: ManifestLoadOutcome,
    #[serde(default)]
    pub diagnostics: Vec<String>,
}

#[cfg(test)]
#[path = "module_tests.rs"]
mod tests;
