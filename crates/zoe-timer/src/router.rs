// SPDX-FileCopyrightText: 2026 Zoe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Timer alert routing.
//!
//! Delivery walks a fixed chain of tiers and stops at the first tier that
//! reaches at least one device:
//!
//! 1. the device the timer was started from, if connected
//! 2. online, connected devices in the room the timer was started in
//! 3. the user's primary alert device, if online
//! 4. every online, connected device of the user
//! 5. a transport-level broadcast to the user
//!
//! Independently of that, a source device that did not get the alert gets a
//! durable offline copy. Every tier attempt yields a [`TierOutcome`] and the
//! next step is chosen by [`next_tier`], which does no I/O.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use zoe_core::{
    Device, DeviceRegistry, OfflineNotificationSink, RealtimeTransport, Timer, TimerNotification,
};

/// Offline copies expire after an hour unless configured otherwise.
pub const DEFAULT_OFFLINE_TTL: Duration = Duration::from_secs(3600);

/// One step of the delivery chain, in fallback order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RouteTier {
    SourceDevice,
    Room,
    Primary,
    UserDevices,
    Broadcast,
}

impl RouteTier {
    pub const ALL: [RouteTier; 5] = [
        RouteTier::SourceDevice,
        RouteTier::Room,
        RouteTier::Primary,
        RouteTier::UserDevices,
        RouteTier::Broadcast,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RouteTier::SourceDevice => "source_device",
            RouteTier::Room => "room",
            RouteTier::Primary => "primary",
            RouteTier::UserDevices => "user_devices",
            RouteTier::Broadcast => "broadcast",
        }
    }
}

impl std::fmt::Display for RouteTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of attempting one tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TierOutcome {
    /// At least one endpoint got the alert. Holds the device ids reached;
    /// a broadcast reaches sessions rather than devices and lists none.
    Delivered(Vec<String>),
    NotDelivered,
}

impl TierOutcome {
    fn from_devices(devices: Vec<String>) -> Self {
        if devices.is_empty() {
            TierOutcome::NotDelivered
        } else {
            TierOutcome::Delivered(devices)
        }
    }
}

/// The routing fields a timer carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RoutingContext {
    pub has_source_device: bool,
    pub has_source_room: bool,
}

/// First tier worth trying for `context`.
pub fn first_tier(context: RoutingContext) -> RouteTier {
    if context.has_source_device {
        RouteTier::SourceDevice
    } else if context.has_source_room {
        RouteTier::Room
    } else {
        RouteTier::Primary
    }
}

/// Decide what to try after `tier` produced `outcome`.
///
/// Returns `None` once something was delivered or the broadcast has run.
/// Tiers whose routing field is missing are skipped.
pub fn next_tier(
    tier: RouteTier,
    outcome: &TierOutcome,
    context: RoutingContext,
) -> Option<RouteTier> {
    if matches!(outcome, TierOutcome::Delivered(_)) {
        return None;
    }
    match tier {
        RouteTier::SourceDevice if context.has_source_room => Some(RouteTier::Room),
        RouteTier::SourceDevice | RouteTier::Room => Some(RouteTier::Primary),
        RouteTier::Primary => Some(RouteTier::UserDevices),
        RouteTier::UserDevices => Some(RouteTier::Broadcast),
        RouteTier::Broadcast => None,
    }
}

/// What one routing pass did.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RoutingReport {
    /// Tiers tried, in order.
    pub attempted: Vec<RouteTier>,
    /// Tier that delivered, if any did.
    pub delivered_by: Option<RouteTier>,
    /// Devices that received the alert directly.
    pub devices: Vec<String>,
    /// Sessions reached by the last-resort broadcast.
    pub broadcast_sessions: usize,
    /// Whether an offline copy was queued for the source device.
    pub offline_queued: bool,
}

impl RoutingReport {
    pub fn delivered(&self) -> bool {
        self.delivered_by.is_some()
    }
}

/// Sends timer alerts through the tier chain.
#[derive(Clone)]
pub struct NotificationRouter {
    transport: Arc<dyn RealtimeTransport>,
    devices: Arc<dyn DeviceRegistry>,
    offline: Arc<dyn OfflineNotificationSink>,
    offline_ttl: Duration,
}

impl NotificationRouter {
    pub fn new(
        transport: Arc<dyn RealtimeTransport>,
        devices: Arc<dyn DeviceRegistry>,
        offline: Arc<dyn OfflineNotificationSink>,
    ) -> Self {
        Self {
            transport,
            devices,
            offline,
            offline_ttl: DEFAULT_OFFLINE_TTL,
        }
    }

    pub fn with_offline_ttl(mut self, ttl: Duration) -> Self {
        self.offline_ttl = ttl;
        self
    }

    pub fn transport(&self) -> &Arc<dyn RealtimeTransport> {
        &self.transport
    }

    /// Route the completion alert for an expired timer.
    pub async fn route_timer(&self, timer: &Timer) -> RoutingReport {
        let notification = TimerNotification::timer_complete(timer);
        self.route(
            &timer.user_id,
            &notification,
            timer.source_device_id.as_deref(),
            timer.source_room.as_deref(),
        )
        .await
    }

    /// Deliver `notification` to the best reachable endpoints of `user_id`.
    ///
    /// Never fails; every error is logged and counts as "not delivered" for
    /// the tier it happened in.
    pub async fn route(
        &self,
        user_id: &str,
        notification: &TimerNotification,
        source_device: Option<&str>,
        source_room: Option<&str>,
    ) -> RoutingReport {
        let context = RoutingContext {
            has_source_device: source_device.is_some(),
            has_source_room: source_room.is_some(),
        };
        let mut report = RoutingReport::default();
        let mut tier = Some(first_tier(context));

        while let Some(current) = tier {
            report.attempted.push(current);
            let outcome = match current {
                RouteTier::SourceDevice => match source_device {
                    Some(device_id) => self.attempt_devices([device_id], notification).await,
                    None => TierOutcome::NotDelivered,
                },
                RouteTier::Room => match source_room {
                    Some(room) => self.attempt_room(user_id, room, notification).await,
                    None => TierOutcome::NotDelivered,
                },
                RouteTier::Primary => self.attempt_primary(user_id, notification).await,
                RouteTier::UserDevices => self.attempt_user_devices(user_id, notification).await,
                RouteTier::Broadcast => {
                    let (outcome, sessions) = self.attempt_broadcast(user_id, notification).await;
                    report.broadcast_sessions = sessions;
                    outcome
                }
            };
            debug!(user_id, tier = %current, ?outcome, "routing tier attempted");

            if let TierOutcome::Delivered(devices) = &outcome {
                report.delivered_by = Some(current);
                report.devices.extend(devices.iter().cloned());
                zoe_metrics::recording::record_timer_notification(current.as_str());
            }
            tier = next_tier(current, &outcome, context);
        }

        if let Some(device_id) = source_device
            && !report.devices.iter().any(|d| d == device_id)
        {
            report.offline_queued = self.queue_offline(device_id, notification).await;
        }

        info!(
            user_id,
            timer_id = %notification.timer_id,
            delivered_by = report.delivered_by.map(RouteTier::as_str).unwrap_or("none"),
            devices = report.devices.len(),
            offline_queued = report.offline_queued,
            "timer notification routed"
        );
        report
    }

    async fn attempt_room(
        &self,
        user_id: &str,
        room: &str,
        notification: &TimerNotification,
    ) -> TierOutcome {
        match self.devices.devices_in_room(user_id, room).await {
            Ok(devices) => {
                let online = online_ids(&devices);
                self.attempt_devices(online.iter().map(String::as_str), notification)
                    .await
            }
            Err(e) => {
                warn!(user_id, room, error = %e, "room device lookup failed");
                TierOutcome::NotDelivered
            }
        }
    }

    async fn attempt_primary(&self, user_id: &str, notification: &TimerNotification) -> TierOutcome {
        match self.devices.primary_device(user_id).await {
            Ok(Some(device)) if device.online => {
                self.attempt_devices([device.id.as_str()], notification).await
            }
            Ok(_) => TierOutcome::NotDelivered,
            Err(e) => {
                warn!(user_id, error = %e, "primary device lookup failed");
                TierOutcome::NotDelivered
            }
        }
    }

    async fn attempt_user_devices(
        &self,
        user_id: &str,
        notification: &TimerNotification,
    ) -> TierOutcome {
        match self.devices.user_devices(user_id).await {
            Ok(devices) => {
                let online = online_ids(&devices);
                self.attempt_devices(online.iter().map(String::as_str), notification)
                    .await
            }
            Err(e) => {
                warn!(user_id, error = %e, "user device lookup failed");
                TierOutcome::NotDelivered
            }
        }
    }

    async fn attempt_broadcast(
        &self,
        user_id: &str,
        notification: &TimerNotification,
    ) -> (TierOutcome, usize) {
        match self.transport.broadcast_to_user(user_id, notification).await {
            Ok(0) => (TierOutcome::NotDelivered, 0),
            Ok(sessions) => (TierOutcome::Delivered(Vec::new()), sessions),
            Err(e) => {
                warn!(user_id, error = %e, "last-resort broadcast failed");
                (TierOutcome::NotDelivered, 0)
            }
        }
    }

    /// Push to every connected device in `ids`; each one is independent.
    async fn attempt_devices<'a>(
        &self,
        ids: impl IntoIterator<Item = &'a str>,
        notification: &TimerNotification,
    ) -> TierOutcome {
        let mut reached = Vec::new();
        for device_id in ids {
            if !self.transport.is_connected(device_id).await {
                continue;
            }
            match self.transport.send_to_device(device_id, notification).await {
                Ok(()) => reached.push(device_id.to_string()),
                Err(e) => warn!(device_id, error = %e, "device send failed"),
            }
        }
        TierOutcome::from_devices(reached)
    }

    async fn queue_offline(&self, device_id: &str, notification: &TimerNotification) -> bool {
        match self
            .offline
            .enqueue_offline(device_id, notification, self.offline_ttl)
            .await
        {
            Ok(id) => {
                debug!(device_id, queue_id = id, "offline notification queued");
                zoe_metrics::recording::record_timer_notification("offline");
                true
            }
            Err(e) => {
                warn!(device_id, error = %e, "offline notification could not be queued");
                false
            }
        }
    }
}

fn online_ids(devices: &[Device]) -> Vec<String> {
    devices
        .iter()
        .filter(|d| d.online)
        .map(|d| d.id.clone())
        .collect()
}
