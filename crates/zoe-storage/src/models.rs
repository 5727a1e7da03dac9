// SPDX-FileCopyrightText: 2026 Zoe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row types that exist only at the storage layer.

use chrono::{DateTime, Utc};

use zoe_core::TimerNotification;

/// A notification parked for a device that was unreachable when it fired.
#[derive(Debug, Clone, PartialEq)]
pub struct OfflineNotification {
    pub id: i64,
    pub device_id: String,
    pub notification: TimerNotification,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub delivered: bool,
}
