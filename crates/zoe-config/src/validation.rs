// SPDX-FileCopyrightText: 2026 Zoe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Semantic checks that serde attributes cannot express.

use crate::diagnostic::ConfigError;
use crate::model::ZoeConfig;

/// Log levels accepted by `agent.log_level`.
pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration.
///
/// Collects every problem instead of stopping at the first one.
pub fn validate_config(config: &ZoeConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.agent.name.trim().is_empty() {
        errors.push(ConfigError::validation("agent.name must not be empty"));
    }

    if !LOG_LEVELS.contains(&config.agent.log_level.as_str()) {
        errors.push(ConfigError::validation(format!(
            "agent.log_level `{}` is not one of {}",
            config.agent.log_level,
            LOG_LEVELS.join(", ")
        )));
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::validation(
            "storage.database_path must not be empty",
        ));
    }

    if config.timers.check_interval_ms == 0 {
        errors.push(ConfigError::validation(
            "timers.check_interval_ms must be greater than zero",
        ));
    }

    if config.timers.offline_ttl_secs == 0 {
        errors.push(ConfigError::validation(
            "timers.offline_ttl_secs must be greater than zero",
        ));
    }

    if config.modules.config_paths.iter().any(|p| p.trim().is_empty()) {
        errors.push(ConfigError::validation(
            "modules.config_paths must not contain empty entries",
        ));
    }

    if config.modules.search_roots.iter().any(|p| p.trim().is_empty()) {
        errors.push(ConfigError::validation(
            "modules.search_roots must not contain empty entries",
        ));
    }

    if config.metrics.default_window_hours == 0 {
        errors.push(ConfigError::validation(
            "metrics.default_window_hours must be greater than zero",
        ));
    }

    if config.metrics.top_intents_limit == 0 {
        errors.push(ConfigError::validation(
            "metrics.top_intents_limit must be greater than zero",
        ));
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
