// SPDX-FileCopyrightText: 2026 Zoe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading with Figment.
//!
//! Lookup order, later layers overriding earlier ones:
//! compiled defaults, `/etc/zoe/zoe.toml`, `~/.config/zoe/zoe.toml`,
//! `./zoe.toml`, then `ZOE_*` environment variables.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::ZoeConfig;

/// System-wide configuration file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/zoe/zoe.toml";

/// Configuration file in the working directory.
pub const LOCAL_CONFIG_PATH: &str = "zoe.toml";

/// Sections that accept `ZOE_<SECTION>_<KEY>` overrides.
const ENV_SECTIONS: &[&str] = &["agent", "storage", "timers", "modules", "metrics"];

/// Per-user configuration file under the XDG config directory.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("zoe").join("zoe.toml"))
}

/// Every file layer in merge order, existing or not.
pub fn config_file_layers() -> Vec<PathBuf> {
    let mut layers = vec![PathBuf::from(SYSTEM_CONFIG_PATH)];
    layers.extend(user_config_path());
    layers.push(PathBuf::from(LOCAL_CONFIG_PATH));
    layers
}

/// Build the full Figment (files + env) without extracting it.
pub fn build_figment() -> Figment {
    config_file_layers()
        .into_iter()
        .fold(
            Figment::new().merge(Serialized::defaults(ZoeConfig::default())),
            |figment, path| figment.merge(Toml::file(path)),
        )
        .merge(env_provider())
}

/// Load configuration from the standard hierarchy with env overrides.
pub fn load_config() -> Result<ZoeConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from an inline TOML string only (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<ZoeConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ZoeConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from one explicit file with env overrides.
pub fn load_config_from_path(path: &Path) -> Result<ZoeConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ZoeConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Environment provider mapping `ZOE_TIMERS_CHECK_INTERVAL_MS` to
/// `timers.check_interval_ms`.
///
/// Only the first underscore after a known section name becomes a dot, so
/// keys that themselves contain underscores survive intact.
fn env_provider() -> Env {
    Env::prefixed("ZOE_").map(|key| {
        let key_str = key.as_str().to_ascii_lowercase();
        ENV_SECTIONS
            .iter()
            .find_map(|section| {
                key_str
                    .strip_prefix(section)
                    .and_then(|rest| rest.strip_prefix('_'))
                    .map(|field| format!("{section}.{field}"))
            })
            .unwrap_or(key_str)
            .into()
    })
}
