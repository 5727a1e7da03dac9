// SPDX-FileCopyrightText: 2026 Zoe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivery-side collaborators of the notification router.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::ZoeError;
use crate::types::{Device, TimerNotification};

/// Real-time push channel to connected devices (WebSocket, etc.).
#[async_trait]
pub trait RealtimeTransport: Send + Sync {
    /// Whether the device currently holds a live connection.
    async fn is_connected(&self, device_id: &str) -> bool;

    /// Pushes a notification to one device.
    async fn send_to_device(
        &self,
        device_id: &str,
        notification: &TimerNotification,
    ) -> Result<(), ZoeError>;

    /// Pushes a notification to every live connection of a user.
    ///
    /// Returns how many connections received it.
    async fn broadcast_to_user(
        &self,
        user_id: &str,
        notification: &TimerNotification,
    ) -> Result<usize, ZoeError>;
}

/// Lookup of registered devices and their presence.
#[async_trait]
pub trait DeviceRegistry: Send + Sync {
    /// The user's devices registered to a room.
    async fn devices_in_room(&self, user_id: &str, room: &str) -> Result<Vec<Device>, ZoeError>;

    /// The user's designated primary alert device, if any.
    async fn primary_device(&self, user_id: &str) -> Result<Option<Device>, ZoeError>;

    /// Every device belonging to a user.
    async fn user_devices(&self, user_id: &str) -> Result<Vec<Device>, ZoeError>;
}

/// Durable store for notifications that must survive a disconnect.
#[async_trait]
pub trait OfflineNotificationSink: Send + Sync {
    /// Queues a notification for a device, expiring after `ttl`.
    ///
    /// Returns the queue entry id.
    async fn enqueue_offline(
        &self,
        device_id: &str,
        notification: &TimerNotification,
        ttl: Duration,
    ) -> Result<i64, ZoeError>;
}
