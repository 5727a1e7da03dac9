// SPDX-FileCopyrightText: 2026 Zoe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams between the core pipeline and its collaborators.
//!
//! Async traits use `#[async_trait]` so they can be held as trait objects.

pub mod intent;
pub mod module;
pub mod notify;

pub use intent::{HandlerRegistry, IntentHandler, MutableIntentTable};
pub use module::ModuleDescriptor;
pub use notify::{DeviceRegistry, OfflineNotificationSink, RealtimeTransport};
