// SPDX-FileCopyrightText: 2026 Zoe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Intent execution metrics for the Zoe assistant.
//!
//! [`MetricsCollector`] keeps the durable, queryable log in SQLite; the
//! [`recording`] helpers mirror the same events into the `metrics` facade.

pub mod collector;
pub mod recording;

pub use collector::{
    IntentCount, IntentMetric, MetricsCollector, PerformanceSummary, TierStats, MAX_TIER,
};
