// SPDX-FileCopyrightText: 2026 Zoe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Zoe integration tests.
//!
//! Provides in-memory stand-ins for the delivery collaborators, canned intent
//! handlers and on-disk module layouts so tests run without devices or a
//! container filesystem.
//!
//! # Components
//!
//! - [`MockTransport`] - Real-time transport with scripted connections and captured sends
//! - [`MockDeviceRegistry`] / [`MockOfflineSink`] - In-memory presence and offline queue
//! - [`ReplyHandler`] / [`FailingHandler`] / [`StaticDescriptor`] - Canned handlers
//! - [`ModuleFixture`] - Temporary `modules.toml` plus module directories

pub mod fixture;
pub mod handlers;
pub mod mock_delivery;
pub mod mock_transport;

pub use fixture::{ModuleFixture, test_database};
pub use handlers::{FailingHandler, ReplyHandler, StaticDescriptor};
pub use mock_delivery::{MockDeviceRegistry, MockOfflineSink, QueuedNotification};
pub use mock_transport::{MockTransport, SentNotification};
