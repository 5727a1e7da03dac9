// SPDX-FileCopyrightText: 2026 Zoe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Optional module support for the Zoe assistant.
//!
//! A module is a directory `<root>/<name>/intents/` holding declarative
//! YAML or TOML intent pattern files and, optionally, a `handlers.toml` that
//! binds the module to a compiled-in
//! [`ModuleDescriptor`](zoe_core::ModuleDescriptor). Enabled modules are
//! listed in `modules.yaml` (or `modules.toml`).

pub mod catalog;
pub mod enablement;
pub mod loader;
pub mod manifest;
pub mod registration;

pub use catalog::ModuleCatalog;
pub use enablement::{Enablement, read_enablement};
pub use loader::{ModuleIntentBundle, ModuleListing, ModuleLoader};
pub use manifest::{FileFormat, HandlerBindings, parse_handler_bindings, parse_pattern_file};
pub use registration::{
    integrate_module_intents, register_module_handlers, register_module_intents,
};
