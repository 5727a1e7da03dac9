// SPDX-FileCopyrightText: 2026 Zoe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Timer store operations.
//!
//! Timers are never deleted here. The only transitions are
//! pending -> completed (by [`claim_expired`]) and pending -> cancelled.

use chrono::{DateTime, Duration, SubsecRound, Utc};
use rusqlite::{OptionalExtension, Row, params};

use zoe_core::types::{format_timestamp, parse_timestamp};
use zoe_core::{NewTimer, Timer, ZoeError};

use crate::database::{Database, map_tr_err};

const TIMER_COLUMNS: &str = "id, user_id, label, duration_seconds, created_at, expires_at,
     completed, cancelled, source_device_id, source_session_id, source_room";

pub(crate) fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    parse_timestamp(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn timer_from_row(row: &Row<'_>) -> rusqlite::Result<Timer> {
    Ok(Timer {
        id: row.get(0)?,
        user_id: row.get(1)?,
        label: row.get(2)?,
        duration_seconds: row.get(3)?,
        created_at: timestamp_column(row, 4)?,
        expires_at: timestamp_column(row, 5)?,
        completed: row.get(6)?,
        cancelled: row.get(7)?,
        source_device_id: row.get(8)?,
        source_session_id: row.get(9)?,
        source_room: row.get(10)?,
    })
}

/// Insert a pending timer that expires `duration_seconds` after `now`.
///
/// `now` is truncated to the stored millisecond precision so the returned
/// timer equals what a later read produces.
pub async fn create_timer(
    db: &Database,
    new: NewTimer,
    now: DateTime<Utc>,
) -> Result<Timer, ZoeError> {
    let now = now.trunc_subsecs(3);
    let expires_at = Duration::try_seconds(new.duration_seconds)
        .and_then(|d| now.checked_add_signed(d))
        .ok_or_else(|| {
            ZoeError::Internal(format!(
                "timer duration out of range: {}s",
                new.duration_seconds
            ))
        })?;
    let timer = Timer {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: new.user_id,
        label: new.label,
        duration_seconds: new.duration_seconds,
        created_at: now,
        expires_at,
        completed: false,
        cancelled: false,
        source_device_id: new.source_device_id,
        source_session_id: new.source_session_id,
        source_room: new.source_room,
    };

    let row = timer.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO timers (id, user_id, label, duration_seconds, created_at, expires_at,
                                     completed, cancelled, source_device_id, source_session_id,
                                     source_room)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, 0, ?7, ?8, ?9)",
                params![
                    row.id,
                    row.user_id,
                    row.label,
                    row.duration_seconds,
                    format_timestamp(row.created_at),
                    format_timestamp(row.expires_at),
                    row.source_device_id,
                    row.source_session_id,
                    row.source_room,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

    Ok(timer)
}

/// Fetch one timer by id.
pub async fn get_timer(db: &Database, id: &str) -> Result<Option<Timer>, ZoeError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {TIMER_COLUMNS} FROM timers WHERE id = ?1"),
                params![id],
                timer_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Atomically claim every expired, unprocessed timer.
///
/// Selection and the `completed = 1` update share one transaction, and the
/// update is guarded by `completed = 0`, so a claimed timer is never returned
/// again. Rows come back in expiry order with `completed` already set.
pub async fn claim_expired(db: &Database, now: DateTime<Utc>) -> Result<Vec<Timer>, ZoeError> {
    let now = format_timestamp(now);
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;

            let expired = {
                let mut stmt = tx.prepare(&format!(
                    "SELECT {TIMER_COLUMNS} FROM timers
                     WHERE completed = 0 AND cancelled = 0 AND expires_at <= ?1
                     ORDER BY expires_at ASC, id ASC"
                ))?;
                let rows = stmt.query_map(params![now], timer_from_row)?;
                rows.collect::<Result<Vec<_>, _>>()?
            };

            let mut claimed = Vec::with_capacity(expired.len());
            for timer in expired {
                let updated = tx.execute(
                    "UPDATE timers SET completed = 1 WHERE id = ?1 AND completed = 0",
                    params![timer.id],
                )?;
                if updated == 1 {
                    claimed.push(Timer {
                        completed: true,
                        ..timer
                    });
                }
            }

            tx.commit()?;
            Ok(claimed)
        })
        .await
        .map_err(map_tr_err)
}

/// Pending timers for a user, soonest first.
pub async fn active_timers(
    db: &Database,
    user_id: &str,
    now: DateTime<Utc>,
) -> Result<Vec<Timer>, ZoeError> {
    let user_id = user_id.to_string();
    let now = format_timestamp(now);
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {TIMER_COLUMNS} FROM timers
                 WHERE user_id = ?1 AND completed = 0 AND cancelled = 0 AND expires_at > ?2
                 ORDER BY expires_at ASC"
            ))?;
            let rows = stmt.query_map(params![user_id, now], timer_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

/// Cancel a user's pending timer.
///
/// Returns `false` when the timer does not exist, belongs to someone else or
/// is already terminal.
pub async fn cancel_timer(db: &Database, user_id: &str, id: &str) -> Result<bool, ZoeError> {
    let user_id = user_id.to_string();
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let updated = conn.execute(
                "UPDATE timers SET cancelled = 1
                 WHERE id = ?1 AND user_id = ?2 AND completed = 0 AND cancelled = 0",
                params![id, user_id],
            )?;
            Ok(updated == 1)
        })
        .await
        .map_err(map_tr_err)
}
