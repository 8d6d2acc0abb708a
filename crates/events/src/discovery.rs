// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Module discovery: walks configured source roots and resolves them into
//! candidate extension directories, deduplicated by canonical path with
//! `repo_local > installed_package > configured_root` precedence.

use conductor_core::ModuleOrigin;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// One configured place to look for extensions.
#[derive(Debug, Clone)]
pub struct ModuleRoot {
    pub origin: ModuleOrigin,
    pub path: PathBuf,
}

impl ModuleRoot {
    pub fn new(origin: ModuleOrigin, path: impl Into<PathBuf>) -> Self {
        Self { origin, path: path.into() }
    }
}

/// A directory that looks like an extension, not yet manifest-validated.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub origin: ModuleOrigin,
    pub path: PathBuf,
}

fn looks_like_extension(dir: &Path) -> bool {
    dir.join("extension.manifest.json").is_file()
        || dir.join("events.mjs").is_file()
        || dir.join("events.js").is_file()
        || dir.join("events.ts").is_file()
}

/// Walks every configured root and returns the deduplicated, precedence- and
/// path-ordered candidate list. Missing roots are skipped silently — a root
/// configured but not yet materialized on disk is not an error.
pub fn discover_candidates(roots: &[ModuleRoot]) -> Vec<Candidate> {
    let mut by_path: HashMap<PathBuf, Candidate> = HashMap::new();

    for root in roots {
        if !root.path.is_dir() {
            continue;
        }
        if looks_like_extension(&root.path) {
            insert_candidate(&mut by_path, root.origin, &root.path);
            continue;
        }
        let Ok(entries) = std::fs::read_dir(&root.path) else { continue };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() && looks_like_extension(&path) {
                insert_candidate(&mut by_path, root.origin, &path);
            }
        }
    }

    let mut candidates: Vec<Candidate> = by_path.into_values().collect();
    candidates.sort_by(|a, b| a.origin.cmp(&b.origin).then_with(|| a.path.cmp(&b.path)));
    candidates
}

fn insert_candidate(by_path: &mut HashMap<PathBuf, Candidate>, origin: ModuleOrigin, path: &Path) {
    let canonical = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    match by_path.get(&canonical) {
        Some(existing) if existing.origin <= origin => {}
        _ => {
            by_path.insert(canonical, Candidate { origin, path: path.to_path_buf() });
        }
    }
}

#[cfg(test)]
#[path = "discovery_tests.rs"]
mod tests;
