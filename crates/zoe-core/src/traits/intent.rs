// SPDX-FileCopyrightText: 2026 Zoe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Intent handler, intent table and handler table traits.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ZoeError;
use crate::types::{IntentPattern, IntentRequest, IntentResult};

/// Executes the action behind one matched intent.
#[async_trait]
pub trait IntentHandler: Send + Sync {
    /// Handles a classified request and returns a structured result.
    async fn handle(&self, request: &IntentRequest) -> Result<IntentResult, ZoeError>;
}

/// A classifier whose intent-pattern table can be extended at startup.
///
/// Implementations may start with no table at all; `ensure_table` creates
/// an empty one on first use.
pub trait MutableIntentTable {
    /// Returns the live pattern table, creating it if it does not exist yet.
    fn ensure_table(&mut self) -> &mut HashMap<String, IntentPattern>;

    /// Looks up one intent definition without creating the table.
    fn intent(&self, name: &str) -> Option<&IntentPattern>;

    /// Inserts or overwrites an intent, returning the previous definition.
    fn upsert_intent(&mut self, name: &str, pattern: IntentPattern) -> Option<IntentPattern> {
        self.ensure_table().insert(name.to_string(), pattern)
    }
}

/// An executor that resolves intent names to handlers.
pub trait HandlerRegistry {
    /// Registers (or replaces) the handler for an intent.
    fn register_handler(&mut self, intent: &str, handler: Arc<dyn IntentHandler>);

    /// Looks up the handler for an intent.
    fn handler(&self, intent: &str) -> Option<Arc<dyn IntentHandler>>;
}
