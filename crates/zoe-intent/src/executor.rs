// SPDX-FileCopyrightText: 2026 Zoe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Intent handler table and dispatch.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use zoe_core::{HandlerRegistry, IntentHandler, IntentRequest, IntentResult, ZoeError};

/// Resolves intent names to handlers and runs them.
///
/// Core and module-provided handlers live in the same table, so both are
/// found the same way.
#[derive(Clone, Default)]
pub struct IntentExecutor {
    handlers: HashMap<String, Arc<dyn IntentHandler>>,
}

impl IntentExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the handler registered for `request.intent`.
    pub async fn execute(&self, request: &IntentRequest) -> Result<IntentResult, ZoeError> {
        let handler = self
            .handler(&request.intent)
            .ok_or_else(|| ZoeError::HandlerNotFound {
                intent: request.intent.clone(),
            })?;
        debug!(intent = %request.intent, user_id = %request.user_id, "dispatching intent");
        handler.handle(request).await
    }

    /// Registered intent names, sorted.
    pub fn intent_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl HandlerRegistry for IntentExecutor {
    fn register_handler(&mut self, intent: &str, handler: Arc<dyn IntentHandler>) {
        self.handlers.insert(intent.to_string(), handler);
    }

    fn handler(&self, intent: &str) -> Option<Arc<dyn IntentHandler>> {
        self.handlers.get(intent).cloned()
    }
}

impl std::fmt::Debug for IntentExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntentExecutor")
            .field("handlers", &self.intent_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zoe_test_utils::ReplyHandler;

    #[tokio::test]
    async fn executes_registered_handler() {
        let mut executor = IntentExecutor::new();
        executor.register_handler("PlaySong", Arc::new(ReplyHandler::new("playing")));

        let result = executor
            .execute(&IntentRequest::new("alice", "PlaySong").with_slot("song", "So What"))
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.message, "playing");
    }

    #[tokio::test]
    async fn unknown_intent_is_handler_not_found() {
        let executor = IntentExecutor::new();
        let err = executor
            .execute(&IntentRequest::new("alice", "Nope"))
            .await
            .unwrap_err();
        assert!(matches!(err, ZoeError::HandlerNotFound { intent } if intent == "Nope"));
    }

    #[test]
    fn re_registering_replaces() {
        let mut executor = IntentExecutor::new();
        let first: Arc<dyn IntentHandler> = Arc::new(ReplyHandler::new("one"));
        executor.register_handler("A", first.clone());
        executor.register_handler("A", Arc::new(ReplyHandler::new("two")));
        assert_eq!(executor.len(), 1);
        assert!(!Arc::ptr_eq(&executor.handler("A").unwrap(), &first));
    }
}
