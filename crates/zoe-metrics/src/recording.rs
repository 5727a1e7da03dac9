// SPDX-FileCopyrightText: 2026 Zoe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric descriptions and recording helpers.
//!
//! Everything goes through the `metrics` facade, so any installed recorder
//! can collect these. Without a recorder the calls are no-ops.

use metrics::{describe_counter, describe_histogram};

/// Describe every Zoe metric. Call once after installing a recorder.
pub fn register_metrics() {
    describe_counter!(
        "zoe_intent_executions_total",
        "Intent classification and execution cycles"
    );
    describe_histogram!(
        "zoe_intent_latency_ms",
        "End-to-end intent latency in milliseconds"
    );
    describe_counter!("zoe_timers_expired_total", "Timers claimed by the expiry scanner");
    describe_counter!(
        "zoe_timer_notifications_total",
        "Timer alerts by the routing tier that delivered them"
    );
    describe_counter!(
        "zoe_timer_callback_failures_total",
        "Timer callbacks that returned an error or panicked"
    );
}

pub fn record_intent(intent: &str, tier: u8, success: bool, latency_ms: f64) {
    metrics::counter!(
        "zoe_intent_executions_total",
        "intent" => intent.to_string(),
        "tier" => tier.to_string(),
        "success" => success.to_string()
    )
    .increment(1);
    metrics::histogram!("zoe_intent_latency_ms", "tier" => tier.to_string()).record(latency_ms);
}

pub fn record_timers_expired(count: usize) {
    metrics::counter!("zoe_timers_expired_total").increment(count as u64);
}

/// `tier` is the routing tier name, e.g. `source_device` or `offline`.
pub fn record_timer_notification(tier: &'static str) {
    metrics::counter!("zoe_timer_notifications_total", "tier" => tier).increment(1);
}

pub fn record_callback_failure(callback_id: &str) {
    metrics::counter!(
        "zoe_timer_callback_failures_total",
        "callback" => callback_id.to_string()
    )
    .increment(1);
}
