// SPDX-FileCopyrightText: 2026 Zoe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock real-time transport for deterministic routing tests.
//!
//! `MockTransport` reports a scripted set of connected devices and captures
//! every push for assertion.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use zoe_core::{RealtimeTransport, TimerNotification, ZoeError};

/// One captured push.
#[derive(Debug, Clone, PartialEq)]
pub enum SentNotification {
    Device {
        device_id: String,
        notification: TimerNotification,
    },
    Broadcast {
        user_id: String,
        notification: TimerNotification,
    },
}

#[derive(Default)]
struct State {
    connected: HashSet<String>,
    failing: HashSet<String>,
    /// Live connection count per user, used by `broadcast_to_user`.
    sessions: HashMap<String, usize>,
    broadcast_fails: bool,
    sent: Vec<SentNotification>,
}

/// A mock transport. Cloning shares the underlying state.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<State>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a device as holding a live connection.
    pub async fn connect(&self, device_id: &str) {
        self.state.lock().await.connected.insert(device_id.to_string());
    }

    pub async fn disconnect(&self, device_id: &str) {
        self.state.lock().await.connected.remove(device_id);
    }

    /// Make sends to a connected device fail.
    pub async fn fail_device(&self, device_id: &str) {
        self.state.lock().await.failing.insert(device_id.to_string());
    }

    /// Set how many live sessions a broadcast to `user_id` reaches.
    pub async fn set_sessions(&self, user_id: &str, count: usize) {
        self.state.lock().await.sessions.insert(user_id.to_string(), count);
    }

    pub async fn fail_broadcasts(&self) {
        self.state.lock().await.broadcast_fails = true;
    }

    pub async fn sent(&self) -> Vec<SentNotification> {
        self.state.lock().await.sent.clone()
    }

    /// Device ids that received a direct push, in order.
    pub async fn delivered_devices(&self) -> Vec<String> {
        self.state
            .lock()
            .await
            .sent
            .iter()
            .filter_map(|s| match s {
                SentNotification::Device { device_id, .. } => Some(device_id.clone()),
                SentNotification::Broadcast { .. } => None,
            })
            .collect()
    }

    /// User ids that received a broadcast, in order.
    pub async fn broadcasts(&self) -> Vec<String> {
        self.state
            .lock()
            .await
            .sent
            .iter()
            .filter_map(|s| match s {
                SentNotification::Broadcast { user_id, .. } => Some(user_id.clone()),
                SentNotification::Device { .. } => None,
            })
            .collect()
    }
}

#[async_trait]
impl RealtimeTransport for MockTransport {
    async fn is_connected(&self, device_id: &str) -> bool {
        self.state.lock().await.connected.contains(device_id)
    }

    async fn send_to_device(
        &self,
        device_id: &str,
        notification: &TimerNotification,
    ) -> Result<(), ZoeError> {
        let mut state = self.state.lock().await;
        if !state.connected.contains(device_id) {
            return Err(ZoeError::transport(format!("device {device_id} not connected")));
        }
        if state.failing.contains(device_id) {
            return Err(ZoeError::transport(format!("send to {device_id} failed")));
        }
        state.sent.push(SentNotification::Device {
            device_id: device_id.to_string(),
            notification: notification.clone(),
        });
        Ok(())
    }

    async fn broadcast_to_user(
        &self,
        user_id: &str,
        notification: &TimerNotification,
    ) -> Result<usize, ZoeError> {
        let mut state = self.state.lock().await;
        if state.broadcast_fails {
            return Err(ZoeError::transport("broadcast failed"));
        }
        let reached = state.sessions.get(user_id).copied().unwrap_or(0);
        state.sent.push(SentNotification::Broadcast {
            user_id: user_id.to_string(),
            notification: notification.clone(),
        });
        Ok(reached)
    }
}
