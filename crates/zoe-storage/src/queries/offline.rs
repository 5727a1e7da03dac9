// SPDX-FileCopyrightText: 2026 Zoe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable queue of notifications waiting for a device to reconnect.

use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{Row, params};

use zoe_core::types::format_timestamp;
use zoe_core::{TimerNotification, ZoeError};

use crate::database::{Database, map_tr_err};
use crate::models::OfflineNotification;
use crate::queries::timers::timestamp_column;

fn offline_from_row(row: &Row<'_>) -> rusqlite::Result<OfflineNotification> {
    let payload: String = row.get(2)?;
    let notification = serde_json::from_str(&payload).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(OfflineNotification {
        id: row.get(0)?,
        device_id: row.get(1)?,
        notification,
        created_at: timestamp_column(row, 3)?,
        expires_at: timestamp_column(row, 4)?,
        delivered: row.get(5)?,
    })
}

/// Queue a notification for `device_id`, expiring `ttl` after `now`.
pub async fn enqueue(
    db: &Database,
    device_id: &str,
    notification: &TimerNotification,
    now: DateTime<Utc>,
    ttl: Duration,
) -> Result<i64, ZoeError> {
    let payload = serde_json::to_string(notification).map_err(ZoeError::storage)?;
    let ttl = chrono::Duration::from_std(ttl)
        .map_err(|e| ZoeError::Internal(format!("offline TTL out of range: {e}")))?;
    let device_id = device_id.to_string();
    let created_at = format_timestamp(now);
    let expires_at = format_timestamp(now + ttl);

    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO offline_notifications (device_id, payload, created_at, expires_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![device_id, payload, created_at, expires_at],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(map_tr_err)
}

/// Undelivered, unexpired notifications for a device, oldest first.
pub async fn pending_for_device(
    db: &Database,
    device_id: &str,
    now: DateTime<Utc>,
) -> Result<Vec<OfflineNotification>, ZoeError> {
    let device_id = device_id.to_string();
    let now = format_timestamp(now);
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, device_id, payload, created_at, expires_at, delivered
                 FROM offline_notifications
                 WHERE device_id = ?1 AND delivered = 0 AND expires_at > ?2
                 ORDER BY id ASC",
            )?;
            let rows = stmt.query_map(params![device_id, now], offline_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn mark_delivered(db: &Database, id: i64) -> Result<(), ZoeError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE offline_notifications SET delivered = 1 WHERE id = ?1",
                params![id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use zoe_core::Priority;

    fn note(label: &str) -> TimerNotification {
        TimerNotification {
            kind: "timer_complete".to_string(),
            timer_id: format!("timer-{label}"),
            label: label.to_string(),
            message: format!("Timer '{label}' is done!"),
            priority: Priority::High,
        }
    }

    #[tokio::test]
    async fn pending_excludes_expired_and_delivered() {
        let db = Database::open_in_memory().await.unwrap();
        let now = Utc.with_ymd_and_hms(2026, 5, 1, 8, 0, 0).unwrap();
        let hour = Duration::from_secs(3600);

        let kept = enqueue(&db, "phone", &note("tea"), now, hour).await.unwrap();
        let delivered = enqueue(&db, "phone", &note("eggs"), now, hour).await.unwrap();
        enqueue(&db, "phone", &note("stale"), now - chrono::Duration::hours(2), hour)
            .await
            .unwrap();
        enqueue(&db, "tablet", &note("other"), now, hour).await.unwrap();
        mark_delivered(&db, delivered).await.unwrap();

        let pending = pending_for_device(&db, "phone", now).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, kept);
        assert_eq!(pending[0].notification, note("tea"));
        assert_eq!(pending[0].expires_at - pending[0].created_at, chrono::Duration::hours(1));
    }
}
