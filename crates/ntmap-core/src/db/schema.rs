//! Schema modification stamps and the one-way sync gate

use rusqlite::{params, Connection};

use crate::error::{Error, Result};
use crate::util::unix_millis_now;

/// `true` if the schema was modified since the last sync
pub fn schema_changed(conn: &Connection) -> Result<bool> {
    let (scm, last_sync): (i64, i64) = conn.query_row(
        "SELECT scm, last_sync FROM col WHERE id = 1",
        [],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;
    Ok(scm > last_sync)
}

/// Mark the schema as modified so the next sync is a one-way sync.
///
/// With `check`, fails with [`Error::SchemaChangeRequiresConfirmation`] when
/// the schema has not already been modified since the last sync. Callers ask
/// the user, then call again with `check = false`.
pub fn mod_schema(conn: &Connection, check: bool) -> Result<()> {
    if check && !schema_changed(conn)? {
        return Err(Error::SchemaChangeRequiresConfirmation);
    }

    // Never stamp at or before the last sync, even with a coarse clock
    let now = unix_millis_now();
    conn.execute(
        "UPDATE col SET scm = MAX(?1, last_sync + 1), modified = ?1 WHERE id = 1",
        params![now],
    )?;
    Ok(())
}

pub fn mark_synced(conn: &Connection) -> Result<()> {
    let now = unix_millis_now();
    conn.execute(
        "UPDATE col SET last_sync = MAX(?1, scm) WHERE id = 1",
        params![now],
    )?;
    Ok(())
}
