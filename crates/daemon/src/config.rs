// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment variable parsing into one immutable [`Config`], read once at
//! process start. Mirrors the teacher's `env.rs` convention of small typed
//! accessors, collected here into a struct so the rest of the process never
//! touches `std::env` directly.

use conductor_core::{ModuleOrigin, TrustMode};
use conductor_events::ModuleRoot;
use conductor_orchestrator::QueueConfig;
use semver::Version;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub queue_enabled: bool,
    pub queue: QueueConfig,
    pub default_job_max_attempts: u32,
    pub default_job_timeout: Duration,
    pub drain_timeout: Duration,
    pub trust_mode: TrustMode,
    pub module_roots: Vec<ModuleRoot>,
    pub core_api_version: Version,
    pub runtime_profile_name: String,
    pub runtime_profile_version: Version,
}

impl Config {
    /// Parses every variable SPEC §6 documents, applying its stated default
    /// when unset. Returns an error as soon as a set variable fails to parse
    /// as its declared type rather than silently falling back to a default.
    pub fn from_env() -> Result<Self, ConfigError> {
        let queue = QueueConfig {
            global_concurrency: parse_env("ORCHESTRATOR_QUEUE_GLOBAL_CONCURRENCY", 2)?,
            max_per_project: parse_env("ORCHESTRATOR_QUEUE_MAX_PER_PROJECT", 100)?,
            max_global: parse_env("ORCHESTRATOR_QUEUE_MAX_GLOBAL", 500)?,
            background_aging_ms: parse_env("ORCHESTRATOR_QUEUE_BACKGROUND_AGING_MS", 15_000)?,
            max_interactive_burst: parse_env("ORCHESTRATOR_QUEUE_MAX_INTERACTIVE_BURST", 3)?,
            drain_timeout: Duration::from_millis(parse_env("ORCHESTRATOR_QUEUE_DRAIN_TIMEOUT_MS", 10_000)?),
            scheduler_tick: QueueConfig::default().scheduler_tick,
        };

        let trust_mode = match env_str("AGENT_EXTENSION_TRUST_MODE") {
            None => TrustMode::Warn,
            Some(raw) => match raw.as_str() {
                "disabled" => TrustMode::Disabled,
                "warn" => TrustMode::Warn,
                "enforced" => TrustMode::Enforced,
                _ => return Err(ConfigError::InvalidValue { var: "AGENT_EXTENSION_TRUST_MODE", value: raw }),
            },
        };

        let mut module_roots = Vec::new();
        for path in path_list("AGENT_EXTENSION_CONFIGURED_ROOTS") {
            module_roots.push(ModuleRoot::new(ModuleOrigin::ConfiguredRoot, path));
        }
        for path in path_list("AGENT_EXTENSION_PACKAGE_ROOTS") {
            module_roots.push(ModuleRoot::new(ModuleOrigin::InstalledPackage, path));
        }

        Ok(Self {
            queue_enabled: parse_env("ORCHESTRATOR_QUEUE_ENABLED", true)?,
            queue,
            default_job_max_attempts: parse_env("ORCHESTRATOR_QUEUE_MAX_ATTEMPTS", 2)?,
            default_job_timeout: Duration::from_millis(parse_env("ORCHESTRATOR_QUEUE_DEFAULT_TIMEOUT_MS", 60_000)?),
            drain_timeout: Duration::from_millis(parse_env("ORCHESTRATOR_QUEUE_DRAIN_TIMEOUT_MS", 10_000)?),
            trust_mode,
            module_roots,
            core_api_version: env_str("CORE_API_VERSION")
                .map(|raw| Version::parse(&raw).map_err(|_| ConfigError::InvalidValue { var: "CORE_API_VERSION", value: raw }))
                .transpose()?
                .unwrap_or_else(|| Version::new(1, 0, 0)),
            runtime_profile_name: env_str("RUNTIME_PROFILE_NAME").unwrap_or_else(|| "fixture-runtime-profile".to_string()),
            runtime_profile_version: env_str("RUNTIME_PROFILE_VERSION")
                .map(|raw| Version::parse(&raw).map_err(|_| ConfigError::InvalidValue { var: "RUNTIME_PROFILE_VERSION", value: raw }))
                .transpose()?
                .unwrap_or_else(|| Version::new(1, 0, 0)),
        })
    }
}

/// Resolution order: `CONDUCTOR_STATE_DIR` > `XDG_STATE_HOME/conductor` >
/// `~/.local/state/conductor`, matching the teacher's `state_dir` precedence.
pub fn state_dir() -> Result<PathBuf, ConfigError> {
    if let Some(dir) = env_str("CONDUCTOR_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Some(xdg) = env_str("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("conductor"));
    }
    let home = env_str("HOME").ok_or(ConfigError::InvalidValue { var: "HOME", value: String::new() })?;
    Ok(PathBuf::from(home).join(".local/state/conductor"))
}

fn env_str(var: &'static str) -> Option<String> {
    std::env::var(var).ok().filter(|s| !s.is_empty())
}

fn path_list(var: &'static str) -> Vec<PathBuf> {
    env_str(var).map(|raw| raw.split(':').filter(|s| !s.is_empty()).map(PathBuf::from).collect()).unwrap_or_default()
}

fn parse_env<T: FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match env_str(var) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue { var, value: raw }),
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
