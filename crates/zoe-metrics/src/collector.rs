// SPDX-FileCopyrightText: 2026 Zoe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Append-only intent execution log with aggregate reports.
//!
//! Writes never fail towards the caller and reads degrade to zero or empty
//! results, because metrics must not break the request path.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, SubsecRound, Utc};
use rusqlite::{Row, params};
use serde::Serialize;
use tracing::{debug, warn};

use zoe_core::types::{format_timestamp, parse_timestamp};
use zoe_core::{InputSource, ZoeError};
use zoe_storage::{Database, map_tr_err};

use crate::recording;

/// Highest classification tier (the general fallback).
pub const MAX_TIER: u8 = 3;

/// Number of intents listed in a performance summary by default.
pub const DEFAULT_TOP_INTENTS: u32 = 10;

/// One intent classification and execution cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntentMetric {
    pub timestamp: DateTime<Utc>,
    pub user_id: String,
    pub intent_name: String,
    /// 0 is the fastest, most deterministic tier; 3 is the fallback.
    pub tier: u8,
    /// Classifier confidence in `0.0..=1.0`.
    pub confidence: f64,
    pub latency_ms: f64,
    pub success: bool,
    pub input_text: String,
    pub source: InputSource,
}

impl IntentMetric {
    /// A successful event stamped with the current time.
    ///
    /// Tiers above [`MAX_TIER`] are clamped to it.
    pub fn new(user_id: impl Into<String>, intent_name: impl Into<String>, tier: u8) -> Self {
        Self {
            timestamp: Utc::now().trunc_subsecs(3),
            user_id: user_id.into(),
            intent_name: intent_name.into(),
            tier: tier.min(MAX_TIER),
            confidence: 1.0,
            latency_ms: 0.0,
            success: true,
            input_text: String::new(),
            source: InputSource::Chat,
        }
    }

    pub fn confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn latency_ms(mut self, latency_ms: f64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    pub fn success(mut self, success: bool) -> Self {
        self.success = success;
        self
    }

    pub fn input(mut self, text: impl Into<String>, source: InputSource) -> Self {
        self.input_text = text.into();
        self.source = source;
        self
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp.trunc_subsecs(3);
        self
    }
}

/// How often an intent fired in a window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntentCount {
    pub intent_name: String,
    pub count: u64,
}

/// Per-tier slice of a performance summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierStats {
    pub tier: u8,
    pub count: u64,
    pub percentage: f64,
    pub avg_latency_ms: f64,
}

/// Everything a dashboard needs in one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceSummary {
    pub window_hours: u32,
    pub total_events: u64,
    /// Tiers 0 through 3, including tiers with no events.
    pub tiers: Vec<TierStats>,
    pub avg_latency_ms: f64,
    pub success_rate: f64,
    pub top_intents: Vec<IntentCount>,
}

fn metric_from_row(row: &Row<'_>) -> rusqlite::Result<IntentMetric> {
    let timestamp: String = row.get(0)?;
    let source: String = row.get(8)?;
    Ok(IntentMetric {
        timestamp: parse_timestamp(&timestamp).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })?,
        user_id: row.get(1)?,
        intent_name: row.get(2)?,
        tier: row.get(3)?,
        confidence: row.get(4)?,
        latency_ms: row.get(5)?,
        success: row.get(6)?,
        input_text: row.get(7)?,
        source: source.parse().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(8, rusqlite::types::Type::Text, Box::new(e))
        })?,
    })
}

const METRIC_COLUMNS: &str =
    "timestamp, user_id, intent_name, tier, confidence, latency_ms, success, input_text, source";

/// Records intent executions into `intent_metrics` and answers reports.
#[derive(Clone)]
pub struct MetricsCollector {
    db: Database,
    top_intents_limit: u32,
}

impl MetricsCollector {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            top_intents_limit: DEFAULT_TOP_INTENTS,
        }
    }

    /// Open a database file and build a collector over it.
    ///
    /// Opening applies migrations, so the schema exists after the first call.
    pub async fn open(path: &str) -> Result<Self, ZoeError> {
        Ok(Self::new(Database::open(path).await?))
    }

    /// Number of intents listed by [`get_performance_summary`](Self::get_performance_summary).
    pub fn with_top_intents_limit(mut self, limit: u32) -> Self {
        self.top_intents_limit = limit;
        self
    }

    /// Append one event. Failures are logged and swallowed.
    ///
    /// An out-of-range tier is stored as [`MAX_TIER`].
    pub async fn record_execution(&self, metric: &IntentMetric) {
        let mut row = metric.clone();
        if row.tier > MAX_TIER {
            warn!(
                intent = %row.intent_name,
                tier = row.tier,
                "intent metric tier out of range, recording as fallback tier"
            );
            row.tier = MAX_TIER;
        }
        recording::record_intent(&row.intent_name, row.tier, row.success, row.latency_ms);

        let result = self
            .db
            .connection()
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO intent_metrics (timestamp, user_id, intent_name, tier, confidence,
                                                 latency_ms, success, input_text, source)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                    params![
                        format_timestamp(row.timestamp),
                        row.user_id,
                        row.intent_name,
                        row.tier,
                        row.confidence,
                        row.latency_ms,
                        row.success,
                        row.input_text,
                        row.source.to_string(),
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err);

        match result {
            Ok(()) => debug!(
                intent = %metric.intent_name,
                tier = metric.tier.min(MAX_TIER),
                success = metric.success,
                latency_ms = metric.latency_ms,
                "intent metric recorded"
            ),
            Err(e) => warn!(
                intent = %metric.intent_name,
                error = %e,
                "failed to record intent metric"
            ),
        }
    }

    /// Lower bound of a window ending now. Windows reaching past the
    /// representable range start at the earliest representable instant.
    fn window_start(window_hours: u32) -> String {
        let since = Duration::try_hours(i64::from(window_hours))
            .and_then(|window| Utc::now().checked_sub_signed(window))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        format_timestamp(since)
    }

    /// Event count per tier. Tiers without events are absent.
    pub async fn get_tier_distribution(&self, window_hours: u32) -> BTreeMap<u8, u64> {
        let since = Self::window_start(window_hours);
        let result = self
            .db
            .connection()
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT tier, COUNT(*) FROM intent_metrics
                     WHERE timestamp >= ?1 GROUP BY tier ORDER BY tier",
                )?;
                let rows = stmt.query_map(params![since], |row| {
                    Ok((row.get::<_, u8>(0)?, row.get::<_, u64>(1)?))
                })?;
                rows.collect::<Result<BTreeMap<_, _>, _>>()
            })
            .await
            .map_err(map_tr_err);
        degrade(result, "tier distribution")
    }

    /// Share of events in the window attributed to `tier`, as a percentage.
    pub async fn get_tier_percentage(&self, tier: u8, window_hours: u32) -> f64 {
        let distribution = self.get_tier_distribution(window_hours).await;
        let total: u64 = distribution.values().sum();
        percentage(distribution.get(&tier).copied().unwrap_or(0), total)
    }

    /// Mean latency in milliseconds, optionally for one tier only.
    pub async fn get_avg_latency(&self, tier: Option<u8>, window_hours: u32) -> f64 {
        let since = Self::window_start(window_hours);
        let result = self
            .db
            .connection()
            .call(move |conn| {
                conn.query_row(
                    "SELECT COALESCE(AVG(latency_ms), 0.0) FROM intent_metrics
                     WHERE timestamp >= ?1 AND (?2 IS NULL OR tier = ?2)",
                    params![since, tier],
                    |row| row.get::<_, f64>(0),
                )
            })
            .await
            .map_err(map_tr_err);
        degrade(result, "average latency")
    }

    /// Percentage of events in the window that succeeded.
    pub async fn get_success_rate(&self, window_hours: u32) -> f64 {
        let since = Self::window_start(window_hours);
        let result = self
            .db
            .connection()
            .call(move |conn| {
                conn.query_row(
                    "SELECT COUNT(*), COALESCE(SUM(success), 0) FROM intent_metrics
                     WHERE timestamp >= ?1",
                    params![since],
                    |row| Ok((row.get::<_, u64>(0)?, row.get::<_, u64>(1)?)),
                )
            })
            .await
            .map_err(map_tr_err);
        let (total, succeeded) = degrade(result, "success rate");
        percentage(succeeded, total)
    }

    /// Most frequent intents, highest count first. Ties break by name.
    pub async fn get_top_intents(&self, limit: u32, window_hours: u32) -> Vec<IntentCount> {
        let since = Self::window_start(window_hours);
        let result = self
            .db
            .connection()
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT intent_name, COUNT(*) AS hits FROM intent_metrics
                     WHERE timestamp >= ?1
                     GROUP BY intent_name
                     ORDER BY hits DESC, intent_name ASC
                     LIMIT ?2",
                )?;
                let rows = stmt.query_map(params![since, limit], |row| {
                    Ok(IntentCount {
                        intent_name: row.get(0)?,
                        count: row.get(1)?,
                    })
                })?;
                rows.collect::<Result<Vec<_>, _>>()
            })
            .await
            .map_err(map_tr_err);
        degrade(result, "top intents")
    }

    /// Most recent failed events, newest first.
    pub async fn get_failed_queries(&self, limit: u32, window_hours: u32) -> Vec<IntentMetric> {
        let since = Self::window_start(window_hours);
        let result = self
            .db
            .connection()
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {METRIC_COLUMNS} FROM intent_metrics
                     WHERE timestamp >= ?1 AND success = 0
                     ORDER BY timestamp DESC, id DESC
                     LIMIT ?2"
                ))?;
                let rows = stmt.query_map(params![since, limit], metric_from_row)?;
                rows.collect::<Result<Vec<_>, _>>()
            })
            .await
            .map_err(map_tr_err);
        degrade(result, "failed queries")
    }

    /// Every event in the window, oldest first.
    pub async fn get_executions(&self, window_hours: u32) -> Vec<IntentMetric> {
        let since = Self::window_start(window_hours);
        let result = self
            .db
            .connection()
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {METRIC_COLUMNS} FROM intent_metrics
                     WHERE timestamp >= ?1
                     ORDER BY timestamp ASC, id ASC"
                ))?;
                let rows = stmt.query_map(params![since], metric_from_row)?;
                rows.collect::<Result<Vec<_>, _>>()
            })
            .await
            .map_err(map_tr_err);
        degrade(result, "executions")
    }

    /// Distribution, latency, success rate and top intents in one report.
    pub async fn get_performance_summary(&self, window_hours: u32) -> PerformanceSummary {
        let distribution = self.get_tier_distribution(window_hours).await;
        let total_events: u64 = distribution.values().sum();

        let mut tiers = Vec::with_capacity(usize::from(MAX_TIER) + 1);
        for tier in 0..=MAX_TIER {
            let count = distribution.get(&tier).copied().unwrap_or(0);
            let avg_latency_ms = if count == 0 {
                0.0
            } else {
                self.get_avg_latency(Some(tier), window_hours).await
            };
            tiers.push(TierStats {
                tier,
                count,
                percentage: percentage(count, total_events),
                avg_latency_ms,
            });
        }

        PerformanceSummary {
            window_hours,
            total_events,
            tiers,
            avg_latency_ms: self.get_avg_latency(None, window_hours).await,
            success_rate: self.get_success_rate(window_hours).await,
            top_intents: self
                .get_top_intents(self.top_intents_limit, window_hours)
                .await,
        }
    }
}

fn percentage(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 * 100.0 / total as f64
    }
}

fn degrade<T: Default>(result: Result<T, ZoeError>, query: &'static str) -> T {
    result.unwrap_or_else(|e| {
        warn!(query, error = %e, "metrics query failed");
        T::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    async fn collector() -> MetricsCollector {
        MetricsCollector::new(Database::open_in_memory().await.unwrap())
    }

    #[tokio::test]
    async fn empty_window_reports_zero() {
        let metrics = collector().await;
        assert_eq!(metrics.get_tier_percentage(0, 24).await, 0.0);
        assert_eq!(metrics.get_success_rate(24).await, 0.0);
        assert_eq!(metrics.get_avg_latency(None, 24).await, 0.0);
        assert_eq!(metrics.get_avg_latency(Some(2), 24).await, 0.0);
        assert!(metrics.get_tier_distribution(24).await.is_empty());
        assert!(metrics.get_top_intents(5, 24).await.is_empty());
    }

    #[tokio::test]
    async fn tier_distribution_counts_per_tier() {
        let metrics = collector().await;
        for tier in [0, 0, 1, 2, 0] {
            metrics
                .record_execution(&IntentMetric::new("alice", "ListAdd", tier))
                .await;
        }

        let distribution = metrics.get_tier_distribution(24).await;
        assert_eq!(distribution, BTreeMap::from([(0, 3), (1, 1), (2, 1)]));
        assert_eq!(metrics.get_tier_percentage(0, 24).await, 60.0);
        assert_eq!(metrics.get_tier_percentage(3, 24).await, 0.0);
    }

    #[tokio::test]
    async fn latency_can_be_scoped_to_a_tier() {
        let metrics = collector().await;
        for (tier, latency) in [(0, 2.0), (0, 4.0), (2, 300.0)] {
            metrics
                .record_execution(&IntentMetric::new("alice", "Weather", tier).latency_ms(latency))
                .await;
        }

        assert_eq!(metrics.get_avg_latency(Some(0), 24).await, 3.0);
        assert_eq!(metrics.get_avg_latency(Some(2), 24).await, 300.0);
        assert!((metrics.get_avg_latency(None, 24).await - 102.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn old_events_fall_outside_window() {
        let metrics = collector().await;
        metrics
            .record_execution(
                &IntentMetric::new("alice", "Old", 1).at(Utc::now() - Duration::hours(48)),
            )
            .await;
        metrics
            .record_execution(&IntentMetric::new("alice", "New", 0))
            .await;

        assert_eq!(metrics.get_executions(24).await.len(), 1);
        assert_eq!(metrics.get_executions(72).await.len(), 2);
    }

    #[tokio::test]
    async fn unbounded_window_covers_everything() {
        let metrics = collector().await;
        metrics
            .record_execution(
                &IntentMetric::new("alice", "Old", 0).at(Utc::now() - Duration::days(3650)),
            )
            .await;

        assert_eq!(metrics.get_tier_percentage(0, u32::MAX).await, 100.0);
        assert_eq!(metrics.get_executions(u32::MAX).await.len(), 1);
        assert_eq!(metrics.get_performance_summary(u32::MAX).await.total_events, 1);
    }

    #[tokio::test]
    async fn unbounded_window_on_empty_log_reports_zero() {
        let metrics = collector().await;
        assert_eq!(metrics.get_tier_percentage(0, u32::MAX).await, 0.0);
    }

    #[tokio::test]
    async fn out_of_range_tiers_are_stored_as_fallback() {
        let metrics = collector().await;
        assert_eq!(IntentMetric::new("alice", "Odd", 7).tier, MAX_TIER);

        let mut metric = IntentMetric::new("alice", "Odd", 0);
        metric.tier = 9;
        metrics.record_execution(&metric).await;

        let stored = metrics.get_executions(24).await;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].tier, MAX_TIER);
        assert_eq!(stored[0].timestamp, metric.timestamp);
    }

    #[tokio::test]
    async fn failed_queries_newest_first() {
        let metrics = collector().await;
        let now = Utc::now();
        for (offset, text) in [(30, "play jazz"), (10, "turn on the moon"), (20, "ok")] {
            let success = text == "ok";
            metrics
                .record_execution(
                    &IntentMetric::new("bob", "unknown", 3)
                        .success(success)
                        .input(text, InputSource::Voice)
                        .at(now - Duration::minutes(offset)),
                )
                .await;
        }

        let failed = metrics.get_failed_queries(10, 24).await;
        let texts: Vec<_> = failed.iter().map(|m| m.input_text.as_str()).collect();
        assert_eq!(texts, vec!["turn on the moon", "play jazz"]);
        assert_eq!(failed[0].source, InputSource::Voice);
    }

    #[tokio::test]
    #[traced_test]
    async fn record_failure_is_swallowed() {
        let metrics = collector().await;
        metrics
            .db
            .connection()
            .call(|conn| conn.execute_batch("DROP TABLE intent_metrics;"))
            .await
            .unwrap();

        metrics
            .record_execution(&IntentMetric::new("alice", "ListAdd", 0))
            .await;
        assert!(logs_contain("failed to record intent metric"));
        assert_eq!(metrics.get_success_rate(24).await, 0.0);
        assert!(logs_contain("metrics query failed"));
    }
}
