// SPDX-FileCopyrightText: 2026 Zoe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Zoe assistant core.

use thiserror::Error;

/// The primary error type used across Zoe traits and core operations.
#[derive(Debug, Error)]
pub enum ZoeError {
    /// Configuration errors (invalid TOML, missing files, malformed module lists).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Real-time transport errors (device unreachable, send failure).
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A module's intent or binding files could not be loaded.
    #[error("module `{module}`: {message}")]
    Module { module: String, message: String },

    /// No handler is registered for the intent.
    #[error("no handler registered for intent `{intent}`")]
    HandlerNotFound { intent: String },

    /// An intent handler failed while executing.
    #[error("handler for `{intent}` failed: {message}")]
    Handler { intent: String, message: String },

    /// A requested record does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ZoeError {
    /// Wrap any error as a storage failure.
    pub fn storage<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        ZoeError::Storage {
            source: Box::new(source),
        }
    }

    /// Build a transport error without an underlying source.
    pub fn transport(message: impl Into<String>) -> Self {
        ZoeError::Transport {
            message: message.into(),
            source: None,
        }
    }
}
