// SPDX-FileCopyrightText: 2026 Zoe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parsers for the files inside a module's `intents/` directory.
//!
//! Pattern files are YAML (`.yaml`, `.yml`) or TOML (`.toml`) and contribute
//! a top-level `intents` mapping:
//!
//! ```yaml
//! intents:
//!   PlaySong:
//!     data:
//!       - sentences: ["play {song}"]
//! ```
//!
//! The optional `handlers.toml` binding file names the compiled-in
//! descriptor that provides the module's handlers:
//!
//! ```toml
//! [bindings]
//! descriptor = "music"
//! intents = ["PlaySong", "PauseMusic"]   # optional allow-list
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use serde::de::DeserializeOwned;

use zoe_core::{IntentPattern, ZoeError};

/// File name of the handler-binding file.
pub const HANDLER_BINDING_FILE: &str = "handlers.toml";

/// Format of a declarative module file, chosen by its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Yaml,
    Toml,
}

impl FileFormat {
    /// `None` for extensions that are neither YAML nor TOML.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "yaml" | "yml" => Some(Self::Yaml),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }

    pub(crate) fn parse<T: DeserializeOwned>(self, content: &str) -> Result<T, String> {
        match self {
            Self::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
            Self::Toml => toml::from_str(content).map_err(|e| e.to_string()),
        }
    }
}

/// Parsed `handlers.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HandlerBindings {
    /// Descriptor to take handlers from. `None` means "same as the module".
    pub descriptor: Option<String>,
    /// Only these intents are bound when present.
    pub intents: Option<Vec<String>>,
}

impl HandlerBindings {
    /// Descriptor name to look up for `module`.
    pub fn descriptor_for<'a>(&'a self, module: &'a str) -> &'a str {
        self.descriptor.as_deref().unwrap_or(module)
    }

    /// Whether `intent` passes the allow-list.
    pub fn allows(&self, intent: &str) -> bool {
        self.intents
            .as_ref()
            .is_none_or(|allowed| allowed.iter().any(|i| i == intent))
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct HandlerBindingFile {
    #[serde(default)]
    bindings: BindingSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct BindingSection {
    descriptor: Option<String>,
    intents: Option<Vec<String>>,
}

/// Parse a `handlers.toml` binding file for `module`.
pub fn parse_handler_bindings(content: &str, module: &str) -> Result<HandlerBindings, ZoeError> {
    let file: HandlerBindingFile = toml::from_str(content).map_err(|e| ZoeError::Module {
        module: module.to_string(),
        message: format!("invalid {HANDLER_BINDING_FILE}: {e}"),
    })?;

    let BindingSection {
        descriptor,
        intents,
    } = file.bindings;

    if descriptor.as_deref().is_some_and(|d| d.trim().is_empty()) {
        return Err(ZoeError::Module {
            module: module.to_string(),
            message: format!("{HANDLER_BINDING_FILE}: descriptor must not be empty"),
        });
    }

    Ok(HandlerBindings {
        descriptor,
        intents,
    })
}

#[derive(Debug, Deserialize)]
struct PatternFile {
    #[serde(default)]
    intents: BTreeMap<String, IntentPattern>,
}

/// Parse one pattern file, returning its `intents` table.
///
/// Other top-level keys (language, lists, expansion rules) are left to the
/// classifier and ignored here. A file without `intents` contributes nothing.
/// YAML nulls have no TOML counterpart and make the file invalid.
pub fn parse_pattern_file(
    content: &str,
    format: FileFormat,
    module: &str,
) -> Result<BTreeMap<String, IntentPattern>, ZoeError> {
    format
        .parse::<PatternFile>(content)
        .map(|file| file.intents)
        .map_err(|e| ZoeError::Module {
            module: module.to_string(),
            message: format!("invalid pattern file: {e}"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bindings_default_to_module_name() {
        let bindings = parse_handler_bindings("", "music").unwrap();
        assert_eq!(bindings.descriptor_for("music"), "music");
        assert!(bindings.allows("Anything"));
    }

    #[test]
    fn bindings_with_allow_list() {
        let toml = r#"
[bindings]
descriptor = "media"
intents = ["PlaySong"]
"#;
        let bindings = parse_handler_bindings(toml, "music").unwrap();
        assert_eq!(bindings.descriptor_for("music"), "media");
        assert!(bindings.allows("PlaySong"));
        assert!(!bindings.allows("PauseMusic"));
    }

    #[test]
    fn empty_descriptor_is_rejected() {
        let err = parse_handler_bindings("[bindings]\ndescriptor = \" \"\n", "music").unwrap_err();
        assert!(err.to_string().contains("descriptor must not be empty"));
    }

    #[test]
    fn unknown_binding_key_is_rejected() {
        let err = parse_handler_bindings("[bindings]\nhandler = \"x\"\n", "music").unwrap_err();
        assert!(matches!(err, ZoeError::Module { ref module, .. } if module == "music"));
    }

    #[test]
    fn pattern_file_keeps_intent_bodies() {
        let toml = r#"
language = "en"

[intents.PlaySong]
data = [{ sentences = ["play {song}", "put on {song}"] }]

[intents.PauseMusic]
data = [{ sentences = ["pause the music"] }]
"#;
        let intents = parse_pattern_file(toml, FileFormat::Toml, "music").unwrap();
        assert_eq!(intents.len(), 2);
        assert_eq!(
            intents["PlaySong"].sentences(),
            vec!["play {song}", "put on {song}"]
        );
    }

    #[test]
    fn yaml_pattern_file_reads_like_toml() {
        let yaml = r#"
language: en
intents:
  PlaySong:
    data:
      - sentences:
          - "play {song}"
          - "put on {song}"
  PauseMusic:
    data:
      - sentences: ["pause the music"]
"#;
        let intents = parse_pattern_file(yaml, FileFormat::Yaml, "music").unwrap();
        assert_eq!(intents.len(), 2);
        assert_eq!(
            intents["PlaySong"].sentences(),
            vec!["play {song}", "put on {song}"]
        );
    }

    #[test]
    fn malformed_yaml_pattern_file_names_module() {
        let err = parse_pattern_file("intents: [unclosed", FileFormat::Yaml, "music").unwrap_err();
        assert!(err.to_string().contains("module `music`"));
    }

    #[test]
    fn formats_follow_extensions() {
        assert_eq!(FileFormat::from_path(Path::new("a/music.yaml")), Some(FileFormat::Yaml));
        assert_eq!(FileFormat::from_path(Path::new("music.yml")), Some(FileFormat::Yaml));
        assert_eq!(FileFormat::from_path(Path::new("music.toml")), Some(FileFormat::Toml));
        assert_eq!(FileFormat::from_path(Path::new("README.md")), None);
        assert_eq!(FileFormat::from_path(Path::new("music")), None);
    }

    #[test]
    fn pattern_file_without_intents_is_empty() {
        assert!(parse_pattern_file("language = \"en\"\n", FileFormat::Toml, "music").unwrap().is_empty());
    }

    #[test]
    fn malformed_pattern_file_names_module() {
        let err = parse_pattern_file("[intents\nbroken", FileFormat::Toml, "music").unwrap_err();
        assert!(err.to_string().contains("module `music`"));
    }
}
