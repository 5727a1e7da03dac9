// SPDX-FileCopyrightText: 2026 Zoe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Module discovery.
//!
//! For every enabled module the loader probes the search roots for
//! `<root>/<name>/intents/`, merges the pattern files found there and binds
//! handlers from the catalog. Discovery never touches the classifier or the
//! executor; see [`crate::registration`] for that.

use std::collections::{BTreeMap, HashMap};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use zoe_config::ModulesConfig;
use zoe_core::{IntentHandler, IntentPattern, ZoeError};

use crate::catalog::ModuleCatalog;
use crate::enablement::{Enablement, read_enablement};
use crate::manifest::{
    FileFormat, HANDLER_BINDING_FILE, HandlerBindings, parse_handler_bindings, parse_pattern_file,
};

/// Everything one enabled module contributes.
#[derive(Clone)]
pub struct ModuleIntentBundle {
    pub module_name: String,
    pub intents: BTreeMap<String, IntentPattern>,
    pub handlers: HashMap<String, Arc<dyn IntentHandler>>,
    /// The module's `intents/` directory.
    pub source_path: PathBuf,
}

impl std::fmt::Debug for ModuleIntentBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut handlers: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        handlers.sort_unstable();
        f.debug_struct("ModuleIntentBundle")
            .field("module_name", &self.module_name)
            .field("intents", &self.intents.keys().collect::<Vec<_>>())
            .field("handlers", &handlers)
            .field("source_path", &self.source_path)
            .finish()
    }
}

/// Status line for one enabled module, as shown by `zoe modules`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleListing {
    pub name: String,
    /// Module directory, when one of the search roots has it.
    pub directory: Option<PathBuf>,
    pub intents: Vec<String>,
    pub handlers: Vec<String>,
    /// Load failure, if the module could not be loaded.
    pub error: Option<String>,
}

/// Discovers enabled modules on disk.
#[derive(Debug, Clone)]
pub struct ModuleLoader {
    config_paths: Vec<PathBuf>,
    search_roots: Vec<PathBuf>,
    catalog: ModuleCatalog,
}

impl ModuleLoader {
    /// A loader using the default container and local-checkout locations.
    pub fn new(catalog: ModuleCatalog) -> Self {
        Self::from_config(&ModulesConfig::default(), catalog)
    }

    pub fn from_config(config: &ModulesConfig, catalog: ModuleCatalog) -> Self {
        Self {
            config_paths: config.config_paths.iter().map(PathBuf::from).collect(),
            search_roots: config.search_roots.iter().map(PathBuf::from).collect(),
            catalog,
        }
    }

    pub fn with_config_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.config_paths = paths;
        self
    }

    pub fn with_search_roots(mut self, roots: Vec<PathBuf>) -> Self {
        self.search_roots = roots;
        self
    }

    pub fn catalog(&self) -> &ModuleCatalog {
        &self.catalog
    }

    /// Read the enablement list.
    pub fn enablement(&self) -> Result<Enablement, ZoeError> {
        read_enablement(&self.config_paths)
    }

    /// Load one bundle per enabled module that defines at least one intent.
    ///
    /// Per-module failures are logged and skip only that module. The only
    /// error returned is an unreadable or malformed enablement file.
    pub fn load_module_intents(&self) -> Result<Vec<ModuleIntentBundle>, ZoeError> {
        let enablement = self.enablement()?;
        let mut bundles = Vec::new();

        for name in &enablement.modules {
            match self.load_module(name) {
                Ok(Some(bundle)) => {
                    info!(
                        module = %name,
                        intents = bundle.intents.len(),
                        handlers = bundle.handlers.len(),
                        path = %bundle.source_path.display(),
                        "module intents loaded"
                    );
                    bundles.push(bundle);
                }
                Ok(None) => debug!(module = %name, "module contributes no intents, skipping"),
                Err(e) => warn!(module = %name, error = %e, "failed to load module, skipping"),
            }
        }

        Ok(bundles)
    }

    /// Load a single module by name.
    ///
    /// `Ok(None)` means the module has no directory, no `intents/` directory
    /// or no intent definitions.
    pub fn load_module(&self, name: &str) -> Result<Option<ModuleIntentBundle>, ZoeError> {
        validate_module_name(name)?;

        let Some(module_dir) = self.find_module_dir(name) else {
            debug!(module = %name, "module directory not found in any search root");
            return Ok(None);
        };
        let intents_dir = module_dir.join("intents");
        if !intents_dir.is_dir() {
            debug!(module = %name, dir = %module_dir.display(), "module has no intents directory");
            return Ok(None);
        }

        let intents = read_pattern_files(&intents_dir, name)?;
        if intents.is_empty() {
            return Ok(None);
        }

        let handlers = self.bind_handlers(&intents_dir, name)?;

        Ok(Some(ModuleIntentBundle {
            module_name: name.to_string(),
            intents,
            handlers,
            source_path: intents_dir,
        }))
    }

    /// Describe every enabled module without registering anything.
    pub fn list_modules(&self) -> Result<Vec<ModuleListing>, ZoeError> {
        let enablement = self.enablement()?;
        let listings = enablement
            .modules
            .into_iter()
            .map(|name| {
                let directory = self.find_module_dir(&name);
                match self.load_module(&name) {
                    Ok(bundle) => {
                        let (intents, handlers) = bundle
                            .map(|b| {
                                let mut handlers: Vec<String> = b.handlers.into_keys().collect();
                                handlers.sort_unstable();
                                (b.intents.into_keys().collect(), handlers)
                            })
                            .unwrap_or_default();
                        ModuleListing {
                            name,
                            directory,
                            intents,
                            handlers,
                            error: None,
                        }
                    }
                    Err(e) => ModuleListing {
                        name,
                        directory,
                        intents: Vec::new(),
                        handlers: Vec::new(),
                        error: Some(e.to_string()),
                    },
                }
            })
            .collect();
        Ok(listings)
    }

    /// First search root holding a directory named after the module.
    pub fn find_module_dir(&self, name: &str) -> Option<PathBuf> {
        self.search_roots
            .iter()
            .map(|root| root.join(name))
            .find(|candidate| candidate.is_dir())
    }

    fn bind_handlers(
        &self,
        intents_dir: &Path,
        module: &str,
    ) -> Result<HashMap<String, Arc<dyn IntentHandler>>, ZoeError> {
        let binding_path = intents_dir.join(HANDLER_BINDING_FILE);
        if !binding_path.is_file() {
            debug!(module, "no handler binding file, intents only");
            return Ok(HashMap::new());
        }

        let content = std::fs::read_to_string(&binding_path).map_err(|e| ZoeError::Module {
            module: module.to_string(),
            message: format!("cannot read {}: {e}", binding_path.display()),
        })?;
        let bindings = parse_handler_bindings(&content, module)?;
        self.resolve_bindings(&bindings, module)
    }

    fn resolve_bindings(
        &self,
        bindings: &HandlerBindings,
        module: &str,
    ) -> Result<HashMap<String, Arc<dyn IntentHandler>>, ZoeError> {
        let descriptor_name = bindings.descriptor_for(module);
        let descriptor = self.catalog.get(descriptor_name).ok_or_else(|| ZoeError::Module {
            module: module.to_string(),
            message: format!(
                "descriptor `{descriptor_name}` is not compiled in (available: {})",
                self.catalog.names().join(", ")
            ),
        })?;

        let mut handlers = descriptor.intent_handlers();
        if let Some(allowed) = &bindings.intents {
            for intent in allowed {
                if !handlers.contains_key(intent) {
                    warn!(module, descriptor = descriptor_name, intent = %intent,
                        "bound intent has no handler in descriptor");
                }
            }
            handlers.retain(|intent, _| bindings.allows(intent));
        }
        Ok(handlers)
    }
}

/// Module names are single path components.
fn validate_module_name(name: &str) -> Result<(), ZoeError> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(ZoeError::Module {
            module: name.to_string(),
            message: "module names must be a single directory name".to_string(),
        }),
    }
}

/// Merge every YAML or TOML pattern file in `intents_dir`, in file-name order.
fn read_pattern_files(
    intents_dir: &Path,
    module: &str,
) -> Result<BTreeMap<String, IntentPattern>, ZoeError> {
    let read_err = |e: std::io::Error| ZoeError::Module {
        module: module.to_string(),
        message: format!("cannot read {}: {e}", intents_dir.display()),
    };

    let mut files: Vec<(PathBuf, FileFormat)> = std::fs::read_dir(intents_dir)
        .map_err(read_err)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(read_err)?
        .into_iter()
        .filter(|path| path.is_file() && path.file_name().is_some_and(|n| n != HANDLER_BINDING_FILE))
        .filter_map(|path| FileFormat::from_path(&path).map(|format| (path, format)))
        .collect();
    files.sort_by(|a, b| a.0.cmp(&b.0));

    let mut merged = BTreeMap::new();
    for (file, format) in files {
        let content = std::fs::read_to_string(&file).map_err(read_err)?;
        for (intent, pattern) in parse_pattern_file(&content, format, module)? {
            if merged.insert(intent.clone(), pattern).is_some() {
                debug!(module, intent = %intent, file = %file.display(),
                    "later pattern file overrides intent");
            }
        }
    }
    Ok(merged)
}
