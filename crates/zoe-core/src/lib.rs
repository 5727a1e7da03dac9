// SPDX-FileCopyrightText: 2026 Zoe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Zoe assistant.
//!
//! This crate provides the error type, the domain types shared by the timer
//! service, module loader and metrics collector, and the trait seams the
//! core pipeline uses to reach its collaborators.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::ZoeError;
pub use types::{
    ActiveTimer, Device, InputSource, IntentPattern, IntentRequest, IntentResult,
    MAX_TIMER_SECONDS, NewTimer, Priority, RequestOrigin, Timer, TimerNotification, TimerState,
};

pub use traits::{
    DeviceRegistry, HandlerRegistry, IntentHandler, ModuleDescriptor, MutableIntentTable,
    OfflineNotificationSink, RealtimeTransport,
};
