// SPDX-FileCopyrightText: 2026 Zoe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Merging module bundles into the live classifier and executor.
//!
//! Intent names share one namespace and the last write wins. Conflicts are
//! allowed but logged at `warn`. Registration is a startup step and is not
//! meant to race with live classification.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use zoe_core::{HandlerRegistry, MutableIntentTable, ZoeError};

use crate::loader::{ModuleIntentBundle, ModuleLoader};

/// Insert every bundle's intents into the classifier's pattern table.
///
/// Creates the table first when the classifier has none. Returns the number
/// of intent definitions written.
pub fn register_module_intents(
    bundles: &[ModuleIntentBundle],
    classifier: &mut dyn MutableIntentTable,
) -> usize {
    let mut owners: HashMap<&str, &str> = HashMap::new();
    let mut written = 0;

    classifier.ensure_table();
    for bundle in bundles {
        for (intent, pattern) in &bundle.intents {
            if let Some(previous_owner) = owners.insert(intent, &bundle.module_name)
                && previous_owner != bundle.module_name
            {
                warn!(
                    intent = %intent,
                    first = previous_owner,
                    second = %bundle.module_name,
                    "intent declared by two modules, last one wins"
                );
            }

            match classifier.upsert_intent(intent, pattern.clone()) {
                Some(previous) if previous != *pattern => warn!(
                    intent = %intent,
                    module = %bundle.module_name,
                    "module intent replaces a different existing definition"
                ),
                Some(_) => debug!(intent = %intent, "identical intent re-registered"),
                None => debug!(intent = %intent, module = %bundle.module_name, "intent registered"),
            }
            written += 1;
        }
    }

    written
}

/// Register every bundle's handlers with the executor.
///
/// Returns the number of handlers written.
pub fn register_module_handlers(
    bundles: &[ModuleIntentBundle],
    executor: &mut dyn HandlerRegistry,
) -> usize {
    let mut written = 0;
    for bundle in bundles {
        for (intent, handler) in &bundle.handlers {
            if let Some(existing) = executor.handler(intent)
                && !Arc::ptr_eq(&existing, handler)
            {
                debug!(
                    intent = %intent,
                    module = %bundle.module_name,
                    "module handler replaces an existing handler"
                );
            }
            executor.register_handler(intent, Arc::clone(handler));
            written += 1;
        }
    }
    written
}

/// Discover modules and merge them into the classifier and executor.
///
/// Returns how many modules were loaded.
pub fn integrate_module_intents(
    loader: &ModuleLoader,
    classifier: &mut dyn MutableIntentTable,
    executor: &mut dyn HandlerRegistry,
) -> Result<usize, ZoeError> {
    let bundles = loader.load_module_intents()?;
    let intents = register_module_intents(&bundles, classifier);
    let handlers = register_module_handlers(&bundles, executor);
    info!(
        modules = bundles.len(),
        intents, handlers, "module intents integrated"
    );
    Ok(bundles.len())
}
