// SPDX-FileCopyrightText: 2026 Zoe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Canned intent handlers and module descriptors.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use zoe_core::{IntentHandler, IntentRequest, IntentResult, ModuleDescriptor, ZoeError};

/// Handler that always succeeds with a fixed message and counts its calls.
#[derive(Debug, Default)]
pub struct ReplyHandler {
    message: String,
    calls: AtomicUsize,
}

impl ReplyHandler {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IntentHandler for ReplyHandler {
    async fn handle(&self, _request: &IntentRequest) -> Result<IntentResult, ZoeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(IntentResult::ok(self.message.clone()))
    }
}

/// Handler that always returns [`ZoeError::Handler`].
#[derive(Debug)]
pub struct FailingHandler {
    message: String,
}

impl FailingHandler {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl IntentHandler for FailingHandler {
    async fn handle(&self, request: &IntentRequest) -> Result<IntentResult, ZoeError> {
        Err(ZoeError::Handler {
            intent: request.intent.clone(),
            message: self.message.clone(),
        })
    }
}

/// Descriptor built from a fixed handler table.
///
/// Each call to `intent_handlers` hands out the same `Arc`s, so tests can
/// check identity with [`Arc::ptr_eq`].
#[derive(Clone)]
pub struct StaticDescriptor {
    name: String,
    handlers: HashMap<String, Arc<dyn IntentHandler>>,
}

impl StaticDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handlers: HashMap::new(),
        }
    }

    /// Bind `intent` to a [`ReplyHandler`] answering `message`.
    pub fn with_reply(self, intent: &str, message: &str) -> Self {
        self.with_handler(intent, Arc::new(ReplyHandler::new(message)))
    }

    pub fn with_handler(mut self, intent: &str, handler: Arc<dyn IntentHandler>) -> Self {
        self.handlers.insert(intent.to_string(), handler);
        self
    }
}

impl ModuleDescriptor for StaticDescriptor {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "static test descriptor"
    }

    fn intent_handlers(&self) -> HashMap<String, Arc<dyn IntentHandler>> {
        self.handlers.clone()
    }
}
