// SPDX-FileCopyrightText: 2026 Zoe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The module enablement list: `enabled_modules` in a YAML (`modules.yaml`)
//! or TOML (`modules.toml`) document.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

use zoe_core::ZoeError;

use crate::manifest::FileFormat;

#[derive(Debug, Deserialize)]
struct EnablementFile {
    #[serde(default)]
    enabled_modules: Vec<String>,
}

/// Which modules are enabled and where that was decided.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Enablement {
    /// Enabled module names, in file order, without duplicates.
    pub modules: Vec<String>,
    /// The file that was read, or `None` when no candidate existed.
    pub source: Option<PathBuf>,
}

/// Read the first existing enablement file among `candidates`.
///
/// No existing candidate means zero modules. A file that exists but cannot be
/// read or parsed is a setup error. `.toml` files are read as TOML and every
/// other file as YAML.
pub fn read_enablement(candidates: &[PathBuf]) -> Result<Enablement, ZoeError> {
    let Some(path) = candidates.iter().find(|p| p.is_file()) else {
        debug!(candidates = candidates.len(), "no module enablement file found");
        return Ok(Enablement::default());
    };

    let content = std::fs::read_to_string(path)
        .map_err(|e| ZoeError::Config(format!("cannot read {}: {e}", path.display())))?;
    let modules = parse_enablement(&content, path)?;
    debug!(path = %path.display(), count = modules.len(), "module enablement loaded");

    Ok(Enablement {
        modules,
        source: Some(path.clone()),
    })
}

fn parse_enablement(content: &str, path: &Path) -> Result<Vec<String>, ZoeError> {
    let format = FileFormat::from_path(path).unwrap_or(FileFormat::Yaml);
    let file: EnablementFile = format
        .parse(content)
        .map_err(|e| ZoeError::Config(format!("invalid {}: {e}", path.display())))?;

    let mut modules: Vec<String> = Vec::with_capacity(file.enabled_modules.len());
    for name in file.enabled_modules {
        let name = name.trim().to_string();
        if name.is_empty() {
            warn!(path = %path.display(), "ignoring empty module name");
        } else if modules.contains(&name) {
            warn!(module = %name, "module listed twice, keeping first entry");
        } else {
            modules.push(name);
        }
    }
    Ok(modules)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_files_mean_no_modules() {
        let dir = tempfile::tempdir().unwrap();
        let enablement = read_enablement(&[dir.path().join("nope.toml")]).unwrap();
        assert!(enablement.modules.is_empty());
        assert!(enablement.source.is_none());
    }

    #[test]
    fn first_existing_candidate_wins() {
        let dir = tempfile::tempdir().unwrap();
        let second = dir.path().join("second.toml");
        let third = dir.path().join("third.toml");
        std::fs::write(&second, "enabled_modules = [\"music\", \" lists \", \"music\", \"\"]\n")
            .unwrap();
        std::fs::write(&third, "enabled_modules = [\"weather\"]\n").unwrap();

        let enablement =
            read_enablement(&[dir.path().join("first.toml"), second.clone(), third]).unwrap();
        assert_eq!(enablement.modules, vec!["music", "lists"]);
        assert_eq!(enablement.source, Some(second));
    }

    #[test]
    fn yaml_enablement_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("modules.yaml");
        std::fs::write(&path, "enabled_modules:\n  - music\n  - lists\n  - music\n").unwrap();

        let enablement = read_enablement(&[path.clone()]).unwrap();
        assert_eq!(enablement.modules, vec!["music", "lists"]);
        assert_eq!(enablement.source, Some(path));
    }

    #[test]
    fn files_without_a_toml_extension_are_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("modules");
        std::fs::write(&path, "enabled_modules: [weather]\n").unwrap();
        assert_eq!(read_enablement(&[path]).unwrap().modules, vec!["weather"]);
    }

    #[test]
    fn malformed_yaml_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("modules.yml");
        std::fs::write(&path, "enabled_modules: music\n").unwrap();
        assert!(matches!(read_enablement(&[path]), Err(ZoeError::Config(_))));
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("modules.toml");
        std::fs::write(&path, "enabled_modules = \"music\"\n").unwrap();
        assert!(matches!(read_enablement(&[path]), Err(ZoeError::Config(_))));
    }
}
