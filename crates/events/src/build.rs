// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Manifest evaluation, registration, and trust enforcement — the pass
//! that turns a candidate directory list into a [`ModuleSnapshot`] plus the
//! full audit trail of every candidate's outcome, survivors and rejects
//! alike.

use crate::discovery::Candidate;
use crate::registry::{EventRegistry, FactoryRegistry};
use crate::snapshot::{BoundHandler, ModuleSnapshot};
use chrono::{DateTime, Utc};
use conductor_core::{
    ExtensionManifest, ManifestLoadOutcome, ManifestLoadRecord, ModuleRecord, SnapshotVersion, TrustMode, TrustStatus,
};
use indexmap::IndexMap;
use semver::{Version, VersionReq};
use std::collections::HashSet;
use std::path::Path;

/// Everything the runtime needs to evaluate compatibility and trust for one
/// build pass.
pub struct BuildContext<'a> {
    pub factories: &'a FactoryRegistry,
    pub trust_mode: TrustMode,
    pub core_api_version: &'a Version,
    pub runtime_profile_name: &'a str,
    pub runtime_profile_version: &'a Version,
}

pub struct BuildOutcome {
    pub snapshot: ModuleSnapshot,
    pub records: Vec<ManifestLoadRecord>,
}

impl BuildOutcome {
    pub fn had_errors(&self) -> bool {
        self.records.iter().any(|r| r.outcome != ManifestLoadOutcome::Loaded)
    }
}

fn read_manifest(dir: &Path) -> Result<ExtensionManifest, String> {
    let manifest_path = dir.join("extension.manifest.json");
    let raw = std::fs::read_to_string(&manifest_path).map_err(|e| e.to_string())?;
    serde_json::from_str(&raw).map_err(|e| e.to_string())
}

fn resolve_entrypoint(dir: &Path, manifest: &ExtensionManifest) -> Option<std::path::PathBuf> {
    if let Some(explicit) = &manifest.entrypoint {
        let path = dir.join(explicit);
        return path.is_file().then_some(path);
    }
    for candidate in ["events.mjs", "events.js", "events.ts"] {
        let path = dir.join(candidate);
        if path.is_file() {
            return Some(path);
        }
    }
    None
}

fn compatible(manifest: &ExtensionManifest, ctx: &BuildContext<'_>) -> bool {
    if let Some(range) = &manifest.core_api_version_range {
        match VersionReq::parse(range) {
            Ok(req) if req.matches(ctx.core_api_version) => {}
            _ => return false,
        }
    }
    if manifest.profiles.is_empty() {
        return true;
    }
    manifest.profiles.iter().any(|p| {
        p.name == ctx.runtime_profile_name
            && VersionReq::parse(&p.version_range).map(|req| req.matches(ctx.runtime_profile_version)).unwrap_or(false)
    })
}

/// Builds one generation of the module snapshot from a discovered,
/// precedence-ordered candidate list. Records an outcome for every
/// candidate — survivors and rejects alike — so audit tooling can explain
/// the whole build, not just what activated.
pub fn build_snapshot(candidates: &[Candidate], ctx: &BuildContext<'_>, version: SnapshotVersion, now: DateTime<Utc>) -> BuildOutcome {
    let mut records = Vec::with_capacity(candidates.len());
    let mut modules = Vec::new();
    let mut handlers_by_event: IndexMap<String, Vec<BoundHandler>> = IndexMap::new();
    let mut seen_agent_ids: HashSet<String> = HashSet::new();
    let mut registration_index: u64 = 0;

    for candidate in candidates {
        let manifest = match read_manifest(&candidate.path) {
            Ok(manifest) => manifest,
            Err(message) => {
                records.push(reject(candidate, ManifestLoadOutcome::InvalidManifest, vec![message]));
                continue;
            }
        };

        let Some(entrypoint) = resolve_entrypoint(&candidate.path, &manifest) else {
            records.push(reject(candidate, ManifestLoadOutcome::MissingEntrypoint, vec!["entrypoint file not found".into()]));
            continue;
        };

        if !compatible(&manifest, ctx) {
            records.push(reject(candidate, ManifestLoadOutcome::IncompatibleRuntime, vec!["runtime/profile version mismatch".into()]));
            continue;
        }

        if seen_agent_ids.contains(&manifest.agent_id) {
            records.push(reject(candidate, ManifestLoadOutcome::AgentIdConflict, vec![format!("agent_id already claimed: {}", manifest.agent_id)]));
            continue;
        }
        seen_agent_ids.insert(manifest.agent_id.clone());

        let Some(factory) = ctx.factories.get(&manifest.name) else {
            records.push(reject(
                candidate,
                ManifestLoadOutcome::MissingEntrypoint,
                vec![format!("no in-process factory registered for module {}", manifest.name)],
            ));
            continue;
        };

        let mut registry = EventRegistry::new(&manifest.name, &mut registration_index);
        factory.register(&mut registry);
        let staged = registry.into_staged();

        let (trust_status, diagnostics) = crate::trust::evaluate(ctx.trust_mode, &manifest.capabilities, &staged);
        if trust_status == TrustStatus::Denied {
            records.push(reject(candidate, ManifestLoadOutcome::TrustDenied, diagnostics));
            continue;
        }

        let handler_count = staged.len();
        for staged_handler in staged {
            handlers_by_event
                .entry(staged_handler.registered.event_type.clone())
                .or_default()
                .push(BoundHandler { registered: staged_handler.registered, handler: staged_handler.handler });
        }

        modules.push(ModuleRecord {
            name: manifest.name.clone(),
            version: manifest.version.clone(),
            agent_id: manifest.agent_id.clone(),
            display_name: manifest.display_name.clone(),
            origin: candidate.origin,
            path: candidate.path.clone(),
            entrypoint,
            capabilities: manifest.capabilities,
            trust_status,
            handler_count,
        });
        records.push(ManifestLoadRecord { module_dir: candidate.path.clone(), outcome: ManifestLoadOutcome::Loaded, diagnostics });
    }

    for handlers in handlers_by_event.values_mut() {
        handlers.sort_by(|a, b| a.registered.order_key().cmp(&b.registered.order_key()));
    }

    BuildOutcome { snapshot: ModuleSnapshot { version, loaded_at: now, modules, handlers_by_event }, records }
}

fn reject(candidate: &Candidate, outcome: ManifestLoadOutcome, diagnostics: Vec<String>) -> ManifestLoadRecord {
    ManifestLoadRecord { module_dir: candidate.path.clone(), outcome, diagnostics }
}

#[cfg(test)]
#[path = "build_tests.rs"]
mod tests;
