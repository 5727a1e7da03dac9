// SPDX-FileCopyrightText: 2026 Zoe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the timer service, module loader and metrics.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::ZoeError;

/// Storage format for every timestamp column.
///
/// Fixed width with millisecond precision, so lexicographic order is time order.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Longest timer that can be set: one week.
pub const MAX_TIMER_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Format a UTC timestamp the way it is stored in SQLite.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a stored timestamp back into a UTC `DateTime`.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, ZoeError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| ZoeError::Internal(format!("invalid timestamp `{raw}`: {e}")))
}

// --- Timers ---

/// Lifecycle state of a timer relative to a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum TimerState {
    /// Not completed, not cancelled, expiry still in the future.
    Pending,
    /// Expiry has passed but the scanner has not claimed it yet.
    ExpiredUnprocessed,
    /// Completed or cancelled.
    Terminal,
}

/// A persisted countdown timer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timer {
    pub id: String,
    pub user_id: String,
    pub label: String,
    pub duration_seconds: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub completed: bool,
    pub cancelled: bool,
    /// Device the timer was started from, used for alert routing.
    pub source_device_id: Option<String>,
    pub source_session_id: Option<String>,
    /// Room the timer was started in, used for alert routing.
    pub source_room: Option<String>,
}

impl Timer {
    /// Returns the lifecycle state of this timer at `now`.
    pub fn state(&self, now: DateTime<Utc>) -> TimerState {
        if self.completed || self.cancelled {
            TimerState::Terminal
        } else if self.expires_at <= now {
            TimerState::ExpiredUnprocessed
        } else {
            TimerState::Pending
        }
    }

    /// Seconds until expiry rounded up, never negative.
    ///
    /// A timer set for 30 seconds reports 30 right after creation, not 29.
    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> i64 {
        let millis = (self.expires_at - now).num_milliseconds();
        (millis.saturating_add(999) / 1000).max(0)
    }
}

/// Parameters for creating a timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTimer {
    pub user_id: String,
    pub label: String,
    pub duration_seconds: i64,
    pub source_device_id: Option<String>,
    pub source_session_id: Option<String>,
    pub source_room: Option<String>,
}

impl NewTimer {
    pub fn new(user_id: impl Into<String>, label: impl Into<String>, duration_seconds: i64) -> Self {
        Self {
            user_id: user_id.into(),
            label: label.into(),
            duration_seconds,
            source_device_id: None,
            source_session_id: None,
            source_room: None,
        }
    }

    pub fn with_device(mut self, device_id: impl Into<String>) -> Self {
        self.source_device_id = Some(device_id.into());
        self
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.source_session_id = Some(session_id.into());
        self
    }

    pub fn with_room(mut self, room: impl Into<String>) -> Self {
        self.source_room = Some(room.into());
        self
    }
}

/// A pending timer with its remaining time computed at query time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveTimer {
    #[serde(flatten)]
    pub timer: Timer,
    pub remaining_seconds: i64,
}

// --- Notifications and devices ---

/// Delivery priority attached to a notification.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Normal,
    High,
}

/// Notification payload pushed to devices when a timer completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerNotification {
    /// Type tag understood by clients, e.g. `timer_complete`.
    #[serde(rename = "type")]
    pub kind: String,
    pub timer_id: String,
    pub label: String,
    pub message: String,
    pub priority: Priority,
}

impl TimerNotification {
    /// Build the standard completion alert for a timer.
    pub fn timer_complete(timer: &Timer) -> Self {
        Self {
            kind: "timer_complete".to_string(),
            timer_id: timer.id.clone(),
            label: timer.label.clone(),
            message: format!("Timer '{}' is done!", timer.label),
            priority: Priority::High,
        }
    }
}

/// A registered user device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub room: Option<String>,
    pub is_primary: bool,
    pub online: bool,
}

// --- Intents ---

/// Channel an utterance arrived through.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InputSource {
    Chat,
    Voice,
    Touch,
    Api,
}

/// Declarative pattern definition for one intent.
///
/// The structure is opaque to the loader; the classifier reads the
/// `data[].sentences` templates out of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IntentPattern(pub toml::Value);

impl IntentPattern {
    /// Sentence templates declared under `data[].sentences`.
    pub fn sentences(&self) -> Vec<&str> {
        self.0
            .get("data")
            .and_then(|d| d.as_array())
            .into_iter()
            .flatten()
            .filter_map(|block| block.get("sentences").and_then(|s| s.as_array()))
            .flatten()
            .filter_map(|s| s.as_str())
            .collect()
    }
}

/// Where an utterance came from, for routing anything it creates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOrigin {
    pub device_id: Option<String>,
    pub session_id: Option<String>,
    pub room: Option<String>,
}

/// A classified request handed to an intent handler.
#[derive(Debug, Clone, PartialEq)]
pub struct IntentRequest {
    pub user_id: String,
    pub intent: String,
    pub slots: HashMap<String, String>,
    pub text: String,
    pub source: InputSource,
    pub origin: RequestOrigin,
}

impl IntentRequest {
    pub fn new(user_id: impl Into<String>, intent: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            intent: intent.into(),
            slots: HashMap::new(),
            text: String::new(),
            source: InputSource::Chat,
            origin: RequestOrigin::default(),
        }
    }

    pub fn with_origin(mut self, origin: RequestOrigin) -> Self {
        self.origin = origin;
        self
    }

    pub fn with_slot(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.slots.insert(name.into(), value.into());
        self
    }

    pub fn slot(&self, name: &str) -> Option<&str> {
        self.slots.get(name).map(String::as_str)
    }
}

/// Structured result returned by an intent handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentResult {
    pub success: bool,
    pub message: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl IntentResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: serde_json::Value::Null,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: serde_json::Value::Null,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }
}
