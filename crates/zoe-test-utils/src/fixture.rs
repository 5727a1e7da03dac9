// SPDX-FileCopyrightText: 2026 Zoe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! On-disk module layouts and throwaway databases.

use std::path::PathBuf;

use tempfile::TempDir;
use zoe_storage::Database;

/// A temporary tree shaped like a deployment:
///
/// ```text
/// <tmp>/config/modules.toml
/// <tmp>/modules/<name>/intents/*.{yaml,toml}
/// ```
///
/// Module directories are created lazily by the `write_*` methods, so an
/// enabled module that is never written stays missing on disk.
pub struct ModuleFixture {
    dir: TempDir,
}

impl ModuleFixture {
    /// Create the tree with `enabled` listed in `modules.toml`.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be written.
    pub fn new(enabled: &[&str]) -> Self {
        let dir = tempfile::tempdir().expect("create fixture dir");
        let fixture = Self { dir };

        std::fs::create_dir_all(fixture.modules_root()).expect("create modules root");
        let config = fixture.config_path();
        std::fs::create_dir_all(config.parent().expect("config parent")).expect("create config dir");
        let list = enabled
            .iter()
            .map(|name| format!("\"{name}\""))
            .collect::<Vec<_>>()
            .join(", ");
        std::fs::write(&config, format!("enabled_modules = [{list}]\n")).expect("write modules.toml");
        fixture
    }

    pub fn root(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.path().join("config").join("modules.toml")
    }

    /// Write `config/modules.yaml` listing `enabled` and return its path.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be written.
    pub fn write_yaml_enablement(&self, enabled: &[&str]) -> PathBuf {
        let path = self.dir.path().join("config").join("modules.yaml");
        let mut content = String::from("enabled_modules:\n");
        for name in enabled {
            content.push_str(&format!("  - {name}\n"));
        }
        std::fs::write(&path, content).expect("write modules.yaml");
        path
    }

    pub fn modules_root(&self) -> PathBuf {
        self.dir.path().join("modules")
    }

    /// A search root that never exists.
    pub fn missing_root(&self) -> PathBuf {
        self.dir.path().join("not-installed")
    }

    /// Write a pattern file into `<module>/intents/`.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be written.
    pub fn write_intents(&self, module: &str, file: &str, content: &str) -> PathBuf {
        let intents = self.modules_root().join(module).join("intents");
        std::fs::create_dir_all(&intents).expect("create intents dir");
        let path = intents.join(file);
        std::fs::write(&path, content).expect("write intent file");
        path
    }

    /// Write `<module>/intents/handlers.toml`.
    pub fn write_bindings(&self, module: &str, content: &str) -> PathBuf {
        self.write_intents(module, "handlers.toml", content)
    }
}

/// Open a migrated in-memory database.
///
/// # Panics
///
/// Panics if migrations fail.
pub async fn test_database() -> Database {
    Database::open_in_memory()
        .await
        .expect("open in-memory database")
}
