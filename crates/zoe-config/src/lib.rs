// SPDX-FileCopyrightText: 2026 Zoe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for the Zoe assistant core.
//!
//! TOML files are layered with Figment, every section rejects unknown keys,
//! and failures are reported as miette diagnostics with typo suggestions.
//!
//! ```no_run
//! let config = zoe_config::load_and_validate().expect("config errors");
//! println!("database: {}", config.storage.database_path);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::Path;

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{
    AgentConfig, MetricsConfig, ModulesConfig, StorageConfig, TimerConfig, ZoeConfig,
};

/// Load the standard file hierarchy plus env overrides, then validate.
pub fn load_and_validate() -> Result<ZoeConfig, Vec<ConfigError>> {
    finish(loader::load_config(), collect_toml_sources)
}

/// Load one explicit file plus env overrides, then validate.
pub fn load_and_validate_path(path: &Path) -> Result<ZoeConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_path(path), || {
        std::fs::read_to_string(path)
            .map(|content| vec![(absolute_display(path), content)])
            .unwrap_or_default()
    })
}

/// Load an inline TOML document, then validate.
pub fn load_and_validate_str(toml_content: &str) -> Result<ZoeConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_str(toml_content), || {
        vec![("<inline>".to_string(), toml_content.to_string())]
    })
}

fn finish(
    loaded: Result<ZoeConfig, figment::Error>,
    sources: impl FnOnce() -> Vec<(String, String)>,
) -> Result<ZoeConfig, Vec<ConfigError>> {
    match loaded {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(err, &sources())),
    }
}

/// Read every existing config layer so diagnostics can show source spans.
fn collect_toml_sources() -> Vec<(String, String)> {
    loader::config_file_layers()
        .into_iter()
        .filter_map(|path| {
            std::fs::read_to_string(&path)
                .ok()
                .map(|content| (absolute_display(&path), content))
        })
        .collect()
}

fn absolute_display(path: &Path) -> String {
    std::path::absolute(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}
