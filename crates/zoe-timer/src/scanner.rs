// SPDX-FileCopyrightText: 2026 Zoe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Expiry detection.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use zoe_core::Timer;
use zoe_storage::Database;
use zoe_storage::queries::timers;

/// Finds expired timers and marks them completed in the same transaction.
///
/// Each timer is returned by exactly one scan. A failed scan is reported as
/// an empty batch; the timers it missed are picked up by the next one.
#[derive(Clone)]
pub struct ExpiryScanner {
    db: Database,
}

impl ExpiryScanner {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn scan(&self) -> Vec<Timer> {
        self.scan_at(Utc::now()).await
    }

    /// Scan as if the current time were `now`.
    pub async fn scan_at(&self, now: DateTime<Utc>) -> Vec<Timer> {
        match timers::claim_expired(&self.db, now).await {
            Ok(batch) => {
                if !batch.is_empty() {
                    debug!(count = batch.len(), "expired timers claimed");
                    zoe_metrics::recording::record_timers_expired(batch.len());
                }
                batch
            }
            Err(e) => {
                warn!(error = %e, "timer scan failed, treating as empty");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use zoe_core::NewTimer;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 9, 0, 0).unwrap()
    }

    async fn scanner_with(durations: &[i64]) -> (ExpiryScanner, Database, Vec<Timer>) {
        let db = Database::open_in_memory().await.unwrap();
        let mut created = Vec::new();
        for (i, secs) in durations.iter().enumerate() {
            let timer = timers::create_timer(&db, NewTimer::new("alice", format!("t{i}"), *secs), t0())
                .await
                .unwrap();
            created.push(timer);
        }
        (ExpiryScanner::new(db.clone()), db, created)
    }

    #[tokio::test]
    async fn expired_timer_is_returned_once() {
        let (scanner, db, created) = scanner_with(&[10]).await;
        let now = t0() + Duration::seconds(15);

        let batch = scanner.scan_at(now).await;
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].id, created[0].id);
        assert!(batch[0].completed);
        assert!(scanner.scan_at(now).await.is_empty());

        let stored = timers::get_timer(&db, &created[0].id).await.unwrap().unwrap();
        assert!(stored.completed);
    }

    #[tokio::test]
    async fn future_timers_are_never_returned() {
        let (scanner, _db, _) = scanner_with(&[60, 3600]).await;
        for offset in [0, 30, 59] {
            assert!(scanner.scan_at(t0() + Duration::seconds(offset)).await.is_empty());
        }
    }

    #[tokio::test]
    async fn cancelled_timers_are_skipped() {
        let (scanner, db, created) = scanner_with(&[5]).await;
        assert!(timers::cancel_timer(&db, "alice", &created[0].id).await.unwrap());
        assert!(scanner.scan_at(t0() + Duration::minutes(5)).await.is_empty());
    }

    #[tokio::test]
    async fn batch_is_ordered_by_expiry() {
        let (scanner, _db, created) = scanner_with(&[30, 10, 20]).await;
        let batch = scanner.scan_at(t0() + Duration::seconds(31)).await;
        let ids: Vec<_> = batch.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec![&created[1].id, &created[2].id, &created[0].id]);
    }

    #[tokio::test]
    async fn store_failure_yields_empty_batch() {
        let (scanner, db, _) = scanner_with(&[1]).await;
        db.connection()
            .call(|conn| conn.execute_batch("DROP TABLE timers;"))
            .await
            .unwrap();
        assert!(scanner.scan_at(t0() + Duration::minutes(1)).await.is_empty());
    }
}
