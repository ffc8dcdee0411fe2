//! Configuration loading with env-var overrides.
//!
//! Reads `config/default.toml` (or an explicit path) relative to the current
//! working directory, then applies `COMMITTEE_WORK_DIR` and
//! `COMMITTEE_LOG_LEVEL` env overrides.

use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;

use crate::error::AppError;
use crate::filter::DisabledAddresses;

/// Registry configuration.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Bootup record file (absolute, or already joined onto `work_dir`).
    pub bootup_file: PathBuf,
    /// Addresses skipped during bootstrap.
    pub disabled_addresses: DisabledAddresses,
}

/// Fully-resolved node configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub node_name: String,
    /// Working directory for all persistent data (already expanded, no `~`).
    pub work_dir: PathBuf,
    pub log_level: String,
    /// Append logs here instead of stderr.
    pub log_file: Option<PathBuf>,
    /// This node's peering endpoint, as it appears in committee records.
    pub own_node: String,
    pub registry: RegistryConfig,
    /// Time granted to committee dismissal after the shutdown signal.
    pub shutdown_grace: Duration,
}

/// Raw TOML shape, the `serde` target before resolution.
#[derive(Deserialize)]
struct RawConfig {
    node: RawNode,
    #[serde(default)]
    registry: RawRegistry,
    #[serde(default)]
    shutdown: RawShutdown,
}

#[derive(Deserialize)]
struct RawNode {
    name: String,
    work_dir: String,
    log_level: String,
    #[serde(default)]
    log_file: Option<String>,
    own_node: String,
}

#[derive(Deserialize)]
struct RawRegistry {
    #[serde(default = "default_bootup_file")]
    bootup_file: String,
    /// Hex-encoded committee addresses.
    #[serde(default)]
    disabled_addresses: Vec<String>,
}

impl Default for RawRegistry {
    fn default() -> Self {
        Self {
            bootup_file: default_bootup_file(),
            disabled_addresses: Vec::new(),
        }
    }
}

#[derive(Deserialize)]
struct RawShutdown {
    #[serde(default = "default_grace_ms")]
    grace_ms: u64,
}

impl Default for RawShutdown {
    fn default() -> Self {
        Self { grace_ms: default_grace_ms() }
    }
}

fn default_bootup_file() -> String { "bootup.json".to_string() }
fn default_grace_ms() -> u64 { 2_000 }

/// Load config from `path` (default `config/default.toml`), then apply env-var overrides.
pub fn load(path: Option<&str>) -> Result<Config, AppError> {
    let work_dir_override = env::var("COMMITTEE_WORK_DIR").ok();
    let log_level_override = env::var("COMMITTEE_LOG_LEVEL").ok();
    load_from(
        Path::new(path.unwrap_or("config/default.toml")),
        work_dir_override.as_deref(),
        log_level_override.as_deref(),
    )
}

/// Internal loader. Accepts an explicit path and optional overrides.
/// Tests pass overrides directly instead of mutating env vars.
pub fn load_from(
    path: &Path,
    work_dir_override: Option<&str>,
    log_level_override: Option<&str>,
) -> Result<Config, AppError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;

    let parsed: RawConfig = toml::from_str(&raw)
        .map_err(|e| AppError::Config(format!("parse error in {}: {e}", path.display())))?;

    let n = parsed.node;

    let work_dir = expand_home(work_dir_override.unwrap_or(&n.work_dir));
    let log_level = log_level_override.unwrap_or(&n.log_level).to_string();
    let log_file = n.log_file.map(|p| resolve_under(&work_dir, &p));
    let bootup_file = resolve_under(&work_dir, &parsed.registry.bootup_file);

    let disabled_addresses = DisabledAddresses::from_hex(&parsed.registry.disabled_addresses)
        .map_err(|e| AppError::Config(format!("[registry].disabled_addresses: {e}")))?;

    if n.own_node.trim().is_empty() {
        return Err(AppError::Config("[node].own_node must not be empty".into()));
    }

    Ok(Config {
        node_name: n.name,
        work_dir,
        log_level,
        log_file,
        own_node: n.own_node,
        registry: RegistryConfig {
            bootup_file,
            disabled_addresses,
        },
        shutdown_grace: Duration::from_millis(parsed.shutdown.grace_ms),
    })
}

/// Expand `~`, then join relative paths onto `base`.
fn resolve_under(base: &Path, path: &str) -> PathBuf {
    let p = expand_home(path);
    if p.is_absolute() { p } else { base.join(p) }
}

/// Expand a leading `~` to the user's home directory.
/// Absolute or relative paths without `~` are returned unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}
