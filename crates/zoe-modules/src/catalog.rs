// SPDX-FileCopyrightText: 2026 Zoe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Catalog of compiled-in module descriptors.
//!
//! A module directory on disk only carries declarative data. Its handlers
//! come from a descriptor registered here under the name its binding file
//! refers to.

use std::collections::HashMap;
use std::sync::Arc;

use zoe_core::ModuleDescriptor;

/// Descriptors keyed by name.
#[derive(Clone, Default)]
pub struct ModuleCatalog {
    descriptors: HashMap<String, Arc<dyn ModuleDescriptor>>,
}

impl ModuleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor, replacing any previous one with the same name.
    pub fn register(&mut self, descriptor: Arc<dyn ModuleDescriptor>) {
        self.descriptors
            .insert(descriptor.name().to_string(), descriptor);
    }

    /// Builder form of [`register`](Self::register).
    pub fn with(mut self, descriptor: Arc<dyn ModuleDescriptor>) -> Self {
        self.register(descriptor);
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ModuleDescriptor>> {
        self.descriptors.get(name).cloned()
    }

    /// Registered descriptor names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.descriptors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

impl std::fmt::Debug for ModuleCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleCatalog")
            .field("descriptors", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zoe_test_utils::StaticDescriptor;

    #[test]
    fn register_replaces_same_name() {
        let mut catalog = ModuleCatalog::new();
        catalog.register(Arc::new(StaticDescriptor::new("music").with_reply("PlaySong", "v1")));
        catalog.register(Arc::new(StaticDescriptor::new("music").with_reply("PlaySong", "v2")));
        catalog.register(Arc::new(StaticDescriptor::new("lists")));

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.names(), vec!["lists", "music"]);
        assert!(catalog.get("weather").is_none());
    }
}
