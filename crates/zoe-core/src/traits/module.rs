// SPDX-FileCopyrightText: 2026 Zoe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Compiled-in module descriptor trait.

use std::collections::HashMap;
use std::sync::Arc;

use crate::traits::intent::IntentHandler;

/// Static description of an optional module's handler bindings.
///
/// Modules ship their declarative intent files on disk; the handlers those
/// intents dispatch to are compiled in and exposed through this trait. A
/// module directory selects its descriptor by name from `intents/handlers.toml`.
pub trait ModuleDescriptor: Send + Sync {
    /// Descriptor name referenced by binding files.
    fn name(&self) -> &str;

    /// Short human-readable description.
    fn description(&self) -> &str {
        ""
    }

    /// Mapping from intent name to handler.
    fn intent_handlers(&self) -> HashMap<String, Arc<dyn IntentHandler>>;
}
