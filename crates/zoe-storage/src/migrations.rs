// SPDX-FileCopyrightText: 2026 Zoe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded schema migrations.
//!
//! The SQL files under `migrations/` are compiled in with refinery and applied
//! every time a database is opened.

use zoe_core::ZoeError;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Apply pending migrations. Returns how many were applied by this call.
pub fn run_migrations(conn: &mut rusqlite::Connection) -> Result<usize, ZoeError> {
    let report = embedded::migrations::runner()
        .run(conn)
        .map_err(ZoeError::storage)?;
    Ok(report.applied_migrations().len())
}
