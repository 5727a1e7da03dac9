// SPDX-FileCopyrightText: 2026 Zoe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rich configuration diagnostics.
//!
//! Figment errors are turned into miette reports that point at the offending
//! key in the TOML source and suggest the closest valid key.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Jaro-Winkler score a candidate must beat to be suggested.
const SUGGESTION_THRESHOLD: f64 = 0.8;

/// A configuration problem ready to be rendered.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(code(zoe::config::unknown_key), help("{help}"))]
    UnknownKey {
        key: String,
        /// Closest valid key, if one is close enough.
        suggestion: Option<String>,
        help: String,
        #[label("not a recognized key")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("invalid value for `{key}`: found {found}")]
    #[diagnostic(code(zoe::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        key: String,
        found: String,
        expected: String,
    },

    #[error("missing required key `{key}`")]
    #[diagnostic(code(zoe::config::missing_key))]
    MissingKey { key: String },

    #[error("validation error: {message}")]
    #[diagnostic(code(zoe::config::validation))]
    Validation { message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(zoe::config::other))]
    Other(String),
}

impl ConfigError {
    pub fn validation(message: impl Into<String>) -> Self {
        ConfigError::Validation {
            message: message.into(),
        }
    }
}

/// Convert every error inside a `figment::Error` into a `ConfigError`.
///
/// `sources` pairs a file path with its content and is used to attach spans.
pub fn figment_to_config_errors(
    err: figment::Error,
    sources: &[(String, String)],
) -> Vec<ConfigError> {
    use figment::error::Kind;

    err.into_iter()
        .map(|error| {
            let section: Vec<String> = error.path.iter().map(ToString::to_string).collect();
            match &error.kind {
                Kind::UnknownField(field, expected) => {
                    let suggestion = suggest_key(field, expected);
                    let help = match &suggestion {
                        Some(s) => format!("did you mean `{s}`? valid keys: {}", expected.join(", ")),
                        None => format!("valid keys: {}", expected.join(", ")),
                    };
                    let (span, src) = source_path(&error)
                        .and_then(|path| sources.iter().find(|(p, _)| *p == path))
                        .and_then(|(path, content)| {
                            locate_key(content, &section, field).map(|offset| {
                                (
                                    Some(SourceSpan::new(offset.into(), field.len())),
                                    Some(NamedSource::new(path, content.clone())),
                                )
                            })
                        })
                        .unwrap_or((None, None));
                    ConfigError::UnknownKey {
                        key: field.clone(),
                        suggestion,
                        help,
                        span,
                        src,
                    }
                }
                Kind::MissingField(field) => ConfigError::MissingKey {
                    key: field.to_string(),
                },
                Kind::InvalidType(actual, expected) => ConfigError::InvalidType {
                    key: section.join("."),
                    found: actual.to_string(),
                    expected: expected.clone(),
                },
                _ => ConfigError::Other(error.to_string()),
            }
        })
        .collect()
}

fn source_path(error: &figment::Error) -> Option<String> {
    match error.metadata.as_ref()?.source.as_ref()? {
        figment::Source::File(path) => Some(path.display().to_string()),
        _ => None,
    }
}

/// Byte offset of `field` inside the `[section]` table of a TOML document.
///
/// Tracks the current table header line by line, so a key with the same name
/// in an earlier table is not matched.
pub fn locate_key(content: &str, section: &[String], field: &str) -> Option<usize> {
    let wanted_table = section.join(".");
    let mut current_table = String::new();
    let mut offset = 0;

    for line in content.split_inclusive('\n') {
        let trimmed = line.trim_start();
        if let Some(header) = trimmed.strip_prefix('[') {
            current_table = header
                .trim_start_matches('[')
                .split(']')
                .next()
                .unwrap_or_default()
                .trim()
                .to_string();
        } else if current_table == wanted_table {
            let is_assignment = trimmed
                .strip_prefix(field)
                .is_some_and(|rest| rest.trim_start().starts_with('='));
            if is_assignment {
                return Some(offset + (line.len() - trimmed.len()));
            }
        }
        offset += line.len();
    }

    None
}

/// Closest valid key by Jaro-Winkler similarity, if above the threshold.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|key| (strsim::jaro_winkler(unknown, key), *key))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key.to_string())
}

/// Render diagnostics to stderr with miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = miette::GraphicalReportHandler::new();
    for error in errors {
        let mut out = String::new();
        match handler.render_report(&mut out, error) {
            Ok(()) => eprint!("{out}"),
            Err(_) => eprintln!("error: {error}"),
        }
    }
}
