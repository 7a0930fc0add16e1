//! Database migrations

use crate::error::Result;
use crate::util::unix_millis_now;
use rusqlite::{params, Connection};

/// Current schema version
const CURRENT_VERSION: i32 = 2;

/// Run all pending migrations
pub fn run(conn: &Connection) -> Result<()> {
    let version = get_version(conn)?;

    if version < 1 {
        migrate_v1(conn)?;
    }
    if version < 2 {
        migrate_v2(conn)?;
    }

    Ok(())
}

/// Get the current schema version
fn get_version(conn: &Connection) -> Result<i32> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
        [],
        |row| row.get(0),
    )?;

    if !exists {
        return Ok(0);
    }

    let version = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

/// Run statements atomically, rolling back on the first failure
fn apply(conn: &Connection, statements: &[&str]) -> Result<()> {
    conn.execute_batch("BEGIN TRANSACTION")?;

    for stmt in statements {
        if let Err(e) = conn.execute(stmt, []) {
            conn.execute_batch("ROLLBACK").ok();
            return Err(e.into());
        }
    }

    if let Err(e) = conn.execute_batch("COMMIT") {
        conn.execute_batch("ROLLBACK").ok();
        return Err(e.into());
    }
    Ok(())
}

/// Migration to version 1: Initial schema
fn migrate_v1(conn: &Connection) -> Result<()> {
    apply(
        conn,
        &[
            // Schema version tracking
            "CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            )",
            // Collection-wide stamps; scm > last_sync means the next sync is one-way
            "CREATE TABLE IF NOT EXISTS col (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                crt INTEGER NOT NULL,
                modified INTEGER NOT NULL,
                scm INTEGER NOT NULL,
                last_sync INTEGER NOT NULL DEFAULT 0
            )",
            "CREATE TABLE IF NOT EXISTS notetypes (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE COLLATE NOCASE,
                is_cloze INTEGER NOT NULL DEFAULT 0,
                fields TEXT NOT NULL,
                templates TEXT NOT NULL,
                modified INTEGER NOT NULL
            )",
            "CREATE TABLE IF NOT EXISTS notes (
                id INTEGER PRIMARY KEY,
                notetype_id INTEGER NOT NULL REFERENCES notetypes(id),
                fields TEXT NOT NULL,
                modified INTEGER NOT NULL
            )",
            "CREATE INDEX IF NOT EXISTS idx_notes_notetype ON notes(notetype_id)",
            "CREATE TABLE IF NOT EXISTS cards (
                id INTEGER PRIMARY KEY,
                note_id INTEGER NOT NULL REFERENCES notes(id) ON DELETE CASCADE,
                ord INTEGER NOT NULL,
                due INTEGER NOT NULL,
                interval INTEGER NOT NULL DEFAULT 0,
                reps INTEGER NOT NULL DEFAULT 0
            )",
            // Not unique: ordinals are rewritten one card at a time during conversion
            "CREATE INDEX IF NOT EXISTS idx_cards_note ON cards(note_id, ord)",
            "INSERT INTO schema_version (version) VALUES (1)",
        ],
    )?;

    let now = unix_millis_now();
    conn.execute(
        "INSERT OR IGNORE INTO col (id, crt, modified, scm, last_sync) VALUES (1, ?1, ?1, ?1, 0)",
        params![now],
    )?;

    tracing::info!("Migrated database to version 1");
    Ok(())
}

/// Migration to version 2: Stock note types
fn migrate_v2(conn: &Connection) -> Result<()> {
    apply(
        conn,
        &[
            r#"INSERT OR IGNORE INTO notetypes (name, is_cloze, fields, templates, modified)
               VALUES ('Basic', 0, '["Front","Back"]', '["Card 1"]', 0)"#,
            r#"INSERT OR IGNORE INTO notetypes (name, is_cloze, fields, templates, modified)
               VALUES ('Basic (and reversed card)', 0, '["Front","Back"]', '["Card 1","Card 2"]', 0)"#,
            r#"INSERT OR IGNORE INTO notetypes (name, is_cloze, fields, templates, modified)
               VALUES ('Basic (optional reversed card)', 0, '["Front","Back","Add Reverse"]', '["Card 1","Card 2"]', 0)"#,
            r#"INSERT OR IGNORE INTO notetypes (name, is_cloze, fields, templates, modified)
               VALUES ('Cloze', 1, '["Text","Back Extra"]', '["Cloze"]', 0)"#,
            "INSERT INTO schema_version (version) VALUES (2)",
        ],
    )?;

    tracing::info!("Migrated database to version {CURRENT_VERSION}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();
        run(&conn).unwrap();

        assert_eq!(get_version(&conn).unwrap(), CURRENT_VERSION);

        let notetypes: i64 = conn
            .query_row("SELECT COUNT(*) FROM notetypes", [], |row| row.get(0))
            .unwrap();
        assert_eq!(notetypes, 4);
    }

    #[test]
    fn test_fresh_database_has_version_zero() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(get_version(&conn).unwrap(), 0);
    }
}
