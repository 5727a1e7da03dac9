// SPDX-FileCopyrightText: 2026 Zoe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementations of the notification router's collaborator traits.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use zoe_core::{Device, DeviceRegistry, OfflineNotificationSink, TimerNotification, ZoeError};

use crate::database::Database;
use crate::queries;

/// Device registry backed by the `devices` table.
#[derive(Clone)]
pub struct SqliteDeviceRegistry {
    db: Database,
}

impl SqliteDeviceRegistry {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DeviceRegistry for SqliteDeviceRegistry {
    async fn devices_in_room(&self, user_id: &str, room: &str) -> Result<Vec<Device>, ZoeError> {
        queries::devices::devices_in_room(&self.db, user_id, room).await
    }

    async fn primary_device(&self, user_id: &str) -> Result<Option<Device>, ZoeError> {
        queries::devices::primary_device(&self.db, user_id).await
    }

    async fn user_devices(&self, user_id: &str) -> Result<Vec<Device>, ZoeError> {
        queries::devices::user_devices(&self.db, user_id).await
    }
}

/// Offline notification sink backed by the `offline_notifications` table.
#[derive(Clone)]
pub struct SqliteOfflineQueue {
    db: Database,
}

impl SqliteOfflineQueue {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl OfflineNotificationSink for SqliteOfflineQueue {
    async fn enqueue_offline(
        &self,
        device_id: &str,
        notification: &TimerNotification,
        ttl: Duration,
    ) -> Result<i64, ZoeError> {
        queries::offline::enqueue(&self.db, device_id, notification, Utc::now(), ttl).await
    }
}
