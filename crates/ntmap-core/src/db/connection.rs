//! Database connection management

use crate::error::Result;
use rusqlite::Connection;
use std::path::Path;

use super::change::SqliteConversionBackend;
use super::repository::{SqliteNoteRepository, SqliteNoteTypeRepository};
use super::{migrations, schema};

/// A flashcard collection stored in a `SQLite` file
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the collection at the given path, creating it if it doesn't exist
    ///
    /// Runs migrations automatically.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        tracing::debug!("Opened collection at {}", path.display());

        let database = Self { conn };
        database.configure()?;
        database.migrate()?;
        Ok(database)
    }

    /// Open an in-memory collection (useful for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;

        let database = Self { conn };
        database.configure()?;
        database.migrate()?;
        Ok(database)
    }

    /// Configure `SQLite` pragmas
    fn configure(&self) -> Result<()> {
        // In-memory databases report "memory" instead of switching to WAL
        self.conn
            .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))
            .ok();
        self.conn.pragma_update(None, "synchronous", "NORMAL")?;
        self.conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(())
    }

    /// Run database migrations
    fn migrate(&self) -> Result<()> {
        migrations::run(&self.conn)
    }

    /// Get a reference to the underlying connection
    pub const fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Note type storage, also the note type provider for sessions
    pub const fn notetypes(&self) -> SqliteNoteTypeRepository<'_> {
        SqliteNoteTypeRepository::new(&self.conn)
    }

    pub const fn notes(&self) -> SqliteNoteRepository<'_> {
        SqliteNoteRepository::new(&self.conn)
    }

    /// The backend that applies change requests to this collection
    pub const fn conversion_backend(&self) -> SqliteConversionBackend<'_> {
        SqliteConversionBackend::new(&self.conn)
    }

    /// `true` if the schema was modified since the last sync
    pub fn schema_changed(&self) -> Result<bool> {
        schema::schema_changed(&self.conn)
    }

    /// Record a completed sync; the next schema change needs confirmation
    pub fn mark_synced(&self) -> Result<()> {
        schema::mark_synced(&self.conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_open_in_memory() {
        let db = Database::open_in_memory().unwrap();
        let count: i64 = db
            .connection()
            .query_row("SELECT COUNT(*) FROM notetypes", [], |row| row.get(0))
            .unwrap();
        assert!(count > 0);
    }

    #[test]
    fn test_open_creates_parent_directories() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("nested").join("collection.db");

        {
            let db = Database::open(&path).unwrap();
            db.mark_synced().unwrap();
        }
        assert!(path.exists());

        // Reopening keeps data and does not re-run migrations
        let db = Database::open(&path).unwrap();
        assert!(!db.schema_changed().unwrap());
    }

    #[test]
    fn test_new_collection_has_unsynced_schema() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.schema_changed().unwrap());
    }
}
