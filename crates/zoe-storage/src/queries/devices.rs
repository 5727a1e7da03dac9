// SPDX-FileCopyrightText: 2026 Zoe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Device registry table.

use chrono::Utc;
use rusqlite::{OptionalExtension, Row, params};

use zoe_core::types::format_timestamp;
use zoe_core::{Device, ZoeError};

use crate::database::{Database, map_tr_err};

fn device_from_row(row: &Row<'_>) -> rusqlite::Result<Device> {
    Ok(Device {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        room: row.get(3)?,
        is_primary: row.get(4)?,
        online: row.get(5)?,
    })
}

/// Insert or replace a device.
///
/// Marking a device primary clears the flag on the user's other devices, so
/// each user has at most one primary device.
pub async fn upsert_device(db: &Database, device: Device) -> Result<(), ZoeError> {
    let now = format_timestamp(Utc::now());
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            if device.is_primary {
                tx.execute(
                    "UPDATE devices SET is_primary = 0 WHERE user_id = ?1 AND id != ?2",
                    params![device.user_id, device.id],
                )?;
            }
            tx.execute(
                "INSERT INTO devices (id, user_id, name, room, is_primary, online, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(id) DO UPDATE SET
                    user_id = excluded.user_id,
                    name = excluded.name,
                    room = excluded.room,
                    is_primary = excluded.is_primary,
                    online = excluded.online,
                    updated_at = excluded.updated_at",
                params![
                    device.id,
                    device.user_id,
                    device.name,
                    device.room,
                    device.is_primary,
                    device.online,
                    now,
                ],
            )?;
            tx.commit()
        })
        .await
        .map_err(map_tr_err)
}

/// Update a device's presence flag. Returns `false` for unknown devices.
pub async fn set_online(db: &Database, device_id: &str, online: bool) -> Result<bool, ZoeError> {
    let device_id = device_id.to_string();
    let now = format_timestamp(Utc::now());
    db.connection()
        .call(move |conn| {
            let updated = conn.execute(
                "UPDATE devices SET online = ?1, updated_at = ?2 WHERE id = ?3",
                params![online, now, device_id],
            )?;
            Ok(updated == 1)
        })
        .await
        .map_err(map_tr_err)
}

/// Devices of `user_id` in `room`. Other users' devices in the same room are
/// never returned.
pub async fn devices_in_room(
    db: &Database,
    user_id: &str,
    room: &str,
) -> Result<Vec<Device>, ZoeError> {
    let (user_id, room) = (user_id.to_string(), room.to_string());
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, name, room, is_primary, online
                 FROM devices WHERE user_id = ?1 AND room = ?2 ORDER BY id",
            )?;
            let rows = stmt.query_map(params![user_id, room], device_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn user_devices(db: &Database, user_id: &str) -> Result<Vec<Device>, ZoeError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, name, room, is_primary, online
                 FROM devices WHERE user_id = ?1 ORDER BY id",
            )?;
            let rows = stmt.query_map(params![user_id], device_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn primary_device(db: &Database, user_id: &str) -> Result<Option<Device>, ZoeError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT id, user_id, name, room, is_primary, online
                 FROM devices WHERE user_id = ?1 AND is_primary = 1 LIMIT 1",
                params![user_id],
                device_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}
