// SPDX-FileCopyrightText: 2026 Zoe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process real-time transport.
//!
//! Each connected device gets an unbounded channel; whatever serves the
//! device (a WebSocket task, a test) drains the receiver. Dropping the
//! receiver is the same as disconnecting.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{RwLock, mpsc};
use tracing::debug;

use zoe_core::{RealtimeTransport, TimerNotification, ZoeError};

struct Connection {
    user_id: String,
    tx: mpsc::UnboundedSender<TimerNotification>,
}

/// Channel-backed [`RealtimeTransport`]. Cloning shares the connection table.
#[derive(Clone, Default)]
pub struct ChannelTransport {
    connections: Arc<RwLock<HashMap<String, Connection>>>,
}

impl ChannelTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a live connection, replacing any previous one for the device.
    pub async fn connect(
        &self,
        device_id: &str,
        user_id: &str,
    ) -> mpsc::UnboundedReceiver<TimerNotification> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.connections.write().await.insert(
            device_id.to_string(),
            Connection {
                user_id: user_id.to_string(),
                tx,
            },
        );
        debug!(device_id, user_id, "device connected");
        rx
    }

    /// Returns whether the device had a connection.
    pub async fn disconnect(&self, device_id: &str) -> bool {
        let removed = self.connections.write().await.remove(device_id).is_some();
        if removed {
            debug!(device_id, "device disconnected");
        }
        removed
    }

    /// Devices with an open channel, sorted.
    pub async fn connected_devices(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .connections
            .read()
            .await
            .iter()
            .filter(|(_, conn)| !conn.tx.is_closed())
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort_unstable();
        ids
    }
}

#[async_trait]
impl RealtimeTransport for ChannelTransport {
    async fn is_connected(&self, device_id: &str) -> bool {
        self.connections
            .read()
            .await
            .get(device_id)
            .is_some_and(|conn| !conn.tx.is_closed())
    }

    async fn send_to_device(
        &self,
        device_id: &str,
        notification: &TimerNotification,
    ) -> Result<(), ZoeError> {
        let connections = self.connections.read().await;
        let conn = connections
            .get(device_id)
            .ok_or_else(|| ZoeError::transport(format!("device {device_id} is not connected")))?;
        conn.tx
            .send(notification.clone())
            .map_err(|_| ZoeError::transport(format!("connection to {device_id} is closed")))
    }

    async fn broadcast_to_user(
        &self,
        user_id: &str,
        notification: &TimerNotification,
    ) -> Result<usize, ZoeError> {
        let connections = self.connections.read().await;
        let reached = connections
            .values()
            .filter(|conn| conn.user_id == user_id)
            .filter(|conn| conn.tx.send(notification.clone()).is_ok())
            .count();
        Ok(reached)
    }
}
