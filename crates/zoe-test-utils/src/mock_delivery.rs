// SPDX-FileCopyrightText: 2026 Zoe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory device registry and offline queue.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use zoe_core::{Device, DeviceRegistry, OfflineNotificationSink, TimerNotification, ZoeError};

/// Device registry over a fixed list. Cloning shares the list.
#[derive(Clone, Default)]
pub struct MockDeviceRegistry {
    devices: Arc<Mutex<Vec<Device>>>,
    failing: Arc<Mutex<bool>>,
}

impl MockDeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a device.
    pub async fn add(&self, device: Device) {
        self.devices.lock().await.push(device);
    }

    /// Shorthand for an online device.
    pub async fn add_online(&self, id: &str, user_id: &str, room: Option<&str>, is_primary: bool) {
        self.add(Device {
            id: id.to_string(),
            user_id: user_id.to_string(),
            name: id.to_string(),
            room: room.map(str::to_string),
            is_primary,
            online: true,
        })
        .await;
    }

    pub async fn set_online(&self, id: &str, online: bool) {
        for device in self.devices.lock().await.iter_mut() {
            if device.id == id {
                device.online = online;
            }
        }
    }

    /// Make every lookup fail with a storage error.
    pub async fn fail_lookups(&self) {
        *self.failing.lock().await = true;
    }

    async fn check(&self) -> Result<(), ZoeError> {
        if *self.failing.lock().await {
            return Err(ZoeError::Internal("device registry unavailable".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl DeviceRegistry for MockDeviceRegistry {
    async fn devices_in_room(&self, user_id: &str, room: &str) -> Result<Vec<Device>, ZoeError> {
        self.check().await?;
        Ok(self
            .devices
            .lock()
            .await
            .iter()
            .filter(|d| d.user_id == user_id && d.room.as_deref() == Some(room))
            .cloned()
            .collect())
    }

    async fn primary_device(&self, user_id: &str) -> Result<Option<Device>, ZoeError> {
        self.check().await?;
        Ok(self
            .devices
            .lock()
            .await
            .iter()
            .find(|d| d.user_id == user_id && d.is_primary)
            .cloned())
    }

    async fn user_devices(&self, user_id: &str) -> Result<Vec<Device>, ZoeError> {
        self.check().await?;
        Ok(self
            .devices
            .lock()
            .await
            .iter()
            .filter(|d| d.user_id == user_id)
            .cloned()
            .collect())
    }
}

/// One entry captured by [`MockOfflineSink`].
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedNotification {
    pub device_id: String,
    pub notification: TimerNotification,
    pub ttl: Duration,
}

/// Offline queue that keeps entries in memory. Cloning shares the queue.
#[derive(Clone, Default)]
pub struct MockOfflineSink {
    queued: Arc<Mutex<Vec<QueuedNotification>>>,
}

impl MockOfflineSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn queued(&self) -> Vec<QueuedNotification> {
        self.queued.lock().await.clone()
    }
}

#[async_trait]
impl OfflineNotificationSink for MockOfflineSink {
    async fn enqueue_offline(
        &self,
        device_id: &str,
        notification: &TimerNotification,
        ttl: Duration,
    ) -> Result<i64, ZoeError> {
        let mut queued = self.queued.lock().await;
        queued.push(QueuedNotification {
            device_id: device_id.to_string(),
            notification: notification.clone(),
            ttl,
        });
        Ok(queued.len() as i64)
    }
}
