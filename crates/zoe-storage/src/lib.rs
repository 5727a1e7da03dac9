// SPDX-FileCopyrightText: 2026 Zoe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence for the Zoe assistant.
//!
//! One WAL-mode database holds timers, intent metrics, devices and queued
//! offline notifications. The schema is embedded with refinery and applied on
//! open; all access goes through a single tokio-rusqlite connection.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;

pub use adapter::{SqliteDeviceRegistry, SqliteOfflineQueue};
pub use database::{Database, map_tr_err};
pub use models::OfflineNotification;
