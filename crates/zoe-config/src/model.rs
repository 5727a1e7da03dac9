// SPDX-FileCopyrightText: 2026 Zoe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! Every section rejects unknown keys so typos surface at startup.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level Zoe configuration. All sections are optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ZoeConfig {
    /// Assistant identity and logging.
    #[serde(default)]
    pub agent: AgentConfig,

    /// SQLite database settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Timer background service settings.
    #[serde(default)]
    pub timers: TimerConfig,

    /// Optional module discovery settings.
    #[serde(default)]
    pub modules: ModulesConfig,

    /// Intent metrics reporting settings.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_agent_name() -> String {
    "zoe".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL journaling.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("zoe").join("zoe.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("zoe.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Timer background service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TimerConfig {
    /// Sleep between expiry scans, in milliseconds.
    #[serde(default = "default_check_interval_ms")]
    pub check_interval_ms: u64,

    /// Lifetime of a queued offline notification, in seconds.
    #[serde(default = "default_offline_ttl_secs")]
    pub offline_ttl_secs: u64,

    /// Register the built-in callback that logs every expiry.
    #[serde(default = "default_log_callback")]
    pub log_callback: bool,
}

impl TimerConfig {
    pub fn check_interval(&self) -> Duration {
        Duration::from_millis(self.check_interval_ms)
    }

    pub fn offline_ttl(&self) -> Duration {
        Duration::from_secs(self.offline_ttl_secs)
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            check_interval_ms: default_check_interval_ms(),
            offline_ttl_secs: default_offline_ttl_secs(),
            log_callback: default_log_callback(),
        }
    }
}

fn default_check_interval_ms() -> u64 {
    1000
}

fn default_offline_ttl_secs() -> u64 {
    3600
}

fn default_log_callback() -> bool {
    true
}

/// Where optional modules are enabled and looked up.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ModulesConfig {
    /// Candidate locations of the module enablement file, probed in order.
    /// First match wins.
    #[serde(default = "default_module_config_paths")]
    pub config_paths: Vec<String>,

    /// Candidate base directories holding `<name>/intents/`, probed in order.
    #[serde(default = "default_module_search_roots")]
    pub search_roots: Vec<String>,
}

impl Default for ModulesConfig {
    fn default() -> Self {
        Self {
            config_paths: default_module_config_paths(),
            search_roots: default_module_search_roots(),
        }
    }
}

// Container layout first, then local checkouts run from the service, crate
// or workspace directory.
fn default_module_config_paths() -> Vec<String> {
    ["/app/config", "config", "../config", "../../config"]
        .into_iter()
        .flat_map(|dir| {
            ["modules.yaml", "modules.yml", "modules.toml"].map(|file| format!("{dir}/{file}"))
        })
        .collect()
}

fn default_module_search_roots() -> Vec<String> {
    vec![
        "/app/modules".to_string(),
        "modules".to_string(),
        "../modules".to_string(),
        "../../modules".to_string(),
    ]
}

/// Intent metrics reporting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    /// Trailing window used by reports when none is given, in hours.
    #[serde(default = "default_window_hours")]
    pub default_window_hours: u32,

    /// Number of intents listed in the performance summary.
    #[serde(default = "default_top_intents_limit")]
    pub top_intents_limit: u32,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            default_window_hours: default_window_hours(),
            top_intents_limit: default_top_intents_limit(),
        }
    }
}

fn default_window_hours() -> u32 {
    24
}

fn default_top_intents_limit() -> u32 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_durations_follow_fields() {
        let timers = TimerConfig {
            check_interval_ms: 250,
            offline_ttl_secs: 60,
            log_callback: false,
        };
        assert_eq!(timers.check_interval(), Duration::from_millis(250));
        assert_eq!(timers.offline_ttl(), Duration::from_secs(60));
    }

    #[test]
    fn module_paths_prefer_container_layout() {
        let modules = ModulesConfig::default();
        assert_eq!(modules.config_paths[0], "/app/config/modules.yaml");
        assert_eq!(modules.config_paths[2], "/app/config/modules.toml");
        assert_eq!(modules.config_paths.len(), 12);
        assert_eq!(modules.search_roots[0], "/app/modules");
        assert_eq!(modules.search_roots.len(), 4);
    }
}
