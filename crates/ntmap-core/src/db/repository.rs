//! Note type and note repository implementations

use crate::error::{Error, Result};
use crate::models::{Card, CardId, Note, NoteId, NoteType, NoteTypeId, CLOZE_TEMPLATE_NAME};
use crate::util::{first_duplicate, unix_millis_now};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

/// Trait for note type storage operations
pub trait NoteTypeRepository {
    /// Get a note type by ID
    fn get(&self, id: NoteTypeId) -> Result<Option<NoteType>>;

    /// All note types, sorted by name
    fn all(&self) -> Result<Vec<NoteType>>;

    /// Find a note type by name (case-insensitive)
    fn by_name(&self, name: &str) -> Result<Option<NoteType>>;

    /// Add a note type; the ID in `note_type` is ignored
    fn add(&self, note_type: &NoteType) -> Result<NoteType>;
}

/// Trait for note storage operations
pub trait NoteRepository {
    /// Create a note of `note_type` along with the cards it generates
    fn create(&self, note_type: &NoteType, fields: Vec<String>) -> Result<Note>;

    /// Get a note by ID
    fn get(&self, id: NoteId) -> Result<Option<Note>>;

    /// List notes, optionally only those of one note type
    fn list(&self, notetype: Option<NoteTypeId>) -> Result<Vec<Note>>;

    /// Cards of a note, ordered by ordinal
    fn cards_of(&self, note_id: NoteId) -> Result<Vec<Card>>;
}

/// Decode a JSON string array stored in a text column
fn json_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Vec<String>> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// `SQLite` implementation of `NoteTypeRepository`
pub struct SqliteNoteTypeRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteNoteTypeRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Parse a note type from a database row
    fn parse_notetype(row: &Row<'_>) -> rusqlite::Result<NoteType> {
        Ok(NoteType {
            id: NoteTypeId(row.get(0)?),
            name: row.get(1)?,
            is_cloze: row.get::<_, i32>(2)? != 0,
            fields: json_column(row, 3)?,
            templates: json_column(row, 4)?,
        })
    }

    fn validate(note_type: &NoteType) -> Result<()> {
        if note_type.name.trim().is_empty() {
            return Err(Error::InvalidInput("Note type name cannot be empty".into()));
        }
        if note_type.fields.is_empty() {
            return Err(Error::InvalidInput(
                "A note type needs at least one field".into(),
            ));
        }
        if note_type.fields.iter().any(|f| f.trim().is_empty()) {
            return Err(Error::InvalidInput("Field names cannot be empty".into()));
        }
        let fields: Vec<&str> = note_type.fields.iter().map(String::as_str).collect();
        if let Some(dup) = first_duplicate(&fields) {
            return Err(Error::InvalidInput(format!("Duplicate field name '{dup}'")));
        }
        if note_type.is_cloze {
            return Ok(());
        }
        if note_type.templates.is_empty() {
            return Err(Error::InvalidInput(
                "A regular note type needs at least one template".into(),
            ));
        }
        if note_type.templates.iter().any(|t| t.trim().is_empty()) {
            return Err(Error::InvalidInput("Template names cannot be empty".into()));
        }
        let templates: Vec<&str> = note_type.templates.iter().map(String::as_str).collect();
        if let Some(dup) = first_duplicate(&templates) {
            return Err(Error::InvalidInput(format!("Duplicate template name '{dup}'")));
        }
        Ok(())
    }
}

impl NoteTypeRepository for SqliteNoteTypeRepository<'_> {
    fn get(&self, id: NoteTypeId) -> Result<Option<NoteType>> {
        let note_type = self
            .conn
            .query_row(
                "SELECT id, name, is_cloze, fields, templates FROM notetypes WHERE id = ?",
                params![id.0],
                Self::parse_notetype,
            )
            .optional()?;
        Ok(note_type)
    }

    fn all(&self) -> Result<Vec<NoteType>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, is_cloze, fields, templates FROM notetypes ORDER BY name COLLATE NOCASE ASC",
        )?;

        let note_types = stmt
            .query_map([], Self::parse_notetype)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(note_types)
    }

    fn by_name(&self, name: &str) -> Result<Option<NoteType>> {
        let note_type = self
            .conn
            .query_row(
                "SELECT id, name, is_cloze, fields, templates FROM notetypes WHERE name = ? COLLATE NOCASE",
                params![name.trim()],
                Self::parse_notetype,
            )
            .optional()?;
        Ok(note_type)
    }

    fn add(&self, note_type: &NoteType) -> Result<NoteType> {
        Self::validate(note_type)?;

        let name = note_type.name.trim().to_string();
        if self.by_name(&name)?.is_some() {
            return Err(Error::InvalidInput(format!(
                "A note type named '{name}' already exists"
            )));
        }

        let templates = if note_type.is_cloze {
            vec![CLOZE_TEMPLATE_NAME.to_string()]
        } else {
            note_type.templates.clone()
        };

        self.conn.execute(
            "INSERT INTO notetypes (name, is_cloze, fields, templates, modified) VALUES (?, ?, ?, ?, ?)",
            params![
                name,
                i32::from(note_type.is_cloze),
                serde_json::to_string(&note_type.fields)?,
                serde_json::to_string(&templates)?,
                unix_millis_now()
            ],
        )?;

        let created = NoteType {
            id: NoteTypeId(self.conn.last_insert_rowid()),
            name,
            fields: note_type.fields.clone(),
            templates,
            is_cloze: note_type.is_cloze,
        };
        tracing::info!("Added {} note type '{}' ({})", created.kind(), created.name, created.id);
        Ok(created)
    }
}

/// `SQLite` implementation of `NoteRepository`
pub struct SqliteNoteRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteNoteRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Parse a note from a database row
    fn parse_note(row: &Row<'_>) -> rusqlite::Result<Note> {
        Ok(Note {
            id: NoteId(row.get(0)?),
            notetype_id: NoteTypeId(row.get(1)?),
            fields: json_column(row, 2)?,
            modified: row.get(3)?,
        })
    }

    fn parse_card(row: &Row<'_>) -> rusqlite::Result<Card> {
        Ok(Card {
            id: CardId(row.get(0)?),
            note_id: NoteId(row.get(1)?),
            ord: row.get(2)?,
            due: row.get(3)?,
            interval: row.get(4)?,
            reps: row.get(5)?,
        })
    }

    /// Insert a fresh, unreviewed card
    pub(crate) fn add_card(&self, note_id: NoteId, ord: usize) -> Result<CardId> {
        // New cards are due in creation order
        self.conn.execute(
            "INSERT INTO cards (note_id, ord, due, interval, reps) VALUES (?, ?, ?, 0, 0)",
            params![note_id.0, ord, note_id.0],
        )?;
        Ok(CardId(self.conn.last_insert_rowid()))
    }
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn create(&self, note_type: &NoteType, fields: Vec<String>) -> Result<Note> {
        if fields.len() != note_type.fields.len() {
            return Err(Error::InvalidInput(format!(
                "Note type '{}' has {} fields, got {}",
                note_type.name,
                note_type.fields.len(),
                fields.len()
            )));
        }

        let now = unix_millis_now();
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO notes (notetype_id, fields, modified) VALUES (?, ?, ?)",
            params![note_type.id.0, serde_json::to_string(&fields)?, now],
        )?;
        let note = Note {
            id: NoteId(tx.last_insert_rowid()),
            notetype_id: note_type.id,
            fields,
            modified: now,
        };

        let ordinals = note_type.card_ordinals(&note.fields);
        for ord in &ordinals {
            SqliteNoteRepository::new(&tx).add_card(note.id, *ord)?;
        }
        tx.commit()?;

        tracing::debug!("Created note {} with {} cards", note.id, ordinals.len());
        Ok(note)
    }

    fn get(&self, id: NoteId) -> Result<Option<Note>> {
        let note = self
            .conn
            .query_row(
                "SELECT id, notetype_id, fields, modified FROM notes WHERE id = ?",
                params![id.0],
                Self::parse_note,
            )
            .optional()?;
        Ok(note)
    }

    fn list(&self, notetype: Option<NoteTypeId>) -> Result<Vec<Note>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, notetype_id, fields, modified
             FROM notes
             WHERE ?1 IS NULL OR notetype_id = ?1
             ORDER BY id ASC",
        )?;

        let notes = stmt
            .query_map(params![notetype.map(|id| id.0)], Self::parse_note)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(notes)
    }

    fn cards_of(&self, note_id: NoteId) -> Result<Vec<Card>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, note_id, ord, due, interval, reps
             FROM cards
             WHERE note_id = ?
             ORDER BY ord ASC, id ASC",
        )?;

        let cards = stmt
            .query_map(params![note_id.0], Self::parse_card)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(cards)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use pretty_assertions::assert_eq;

    fn setup() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_stock_notetypes_sorted_by_name() {
        let db = setup();
        let names: Vec<String> = db
            .notetypes()
            .all()
            .unwrap()
            .into_iter()
            .map(|nt| nt.name)
            .collect();

        assert_eq!(
            names,
            vec![
                "Basic",
                "Basic (and reversed card)",
                "Basic (optional reversed card)",
                "Cloze",
            ]
        );
    }

    #[test]
    fn test_get_by_name_ignores_case() {
        let db = setup();
        let cloze = db.notetypes().by_name("cloze").unwrap().unwrap();
        assert!(cloze.is_cloze);
        assert_eq!(cloze.templates, strings(&[CLOZE_TEMPLATE_NAME]));

        let fetched = db.notetypes().get(cloze.id).unwrap().unwrap();
        assert_eq!(fetched, cloze);
    }

    #[test]
    fn test_get_missing_notetype() {
        let db = setup();
        assert!(db.notetypes().get(NoteTypeId(999)).unwrap().is_none());
    }

    #[test]
    fn test_add_notetype() {
        let db = setup();
        let repo = db.notetypes();

        let created = repo
            .add(&NoteType::regular(
                NoteTypeId(0),
                "Vocab",
                &["Word", "Meaning", "Example"],
                &["Recognition", "Recall"],
            ))
            .unwrap();
        assert_ne!(created.id, NoteTypeId(0));

        let fetched = repo.get(created.id).unwrap().unwrap();
        assert_eq!(fetched, created);
    }

    #[test]
    fn test_add_cloze_notetype_forces_single_template() {
        let db = setup();
        let mut note_type = NoteType::cloze(NoteTypeId(0), "My Cloze", &["Text"]);
        note_type.templates = strings(&["Ignored", "Also ignored"]);

        let created = db.notetypes().add(&note_type).unwrap();
        assert_eq!(created.templates, strings(&[CLOZE_TEMPLATE_NAME]));
    }

    #[test]
    fn test_add_rejects_invalid_notetypes() {
        let db = setup();
        let repo = db.notetypes();

        let duplicate_name = NoteType::regular(NoteTypeId(0), "basic", &["A"], &["T"]);
        let no_fields = NoteType::regular(NoteTypeId(0), "Empty", &[], &["T"]);
        let duplicate_field = NoteType::regular(NoteTypeId(0), "Dup", &["A", "A"], &["T"]);
        let no_templates = NoteType::regular(NoteTypeId(0), "Bare", &["A"], &[]);

        for note_type in [duplicate_name, no_fields, duplicate_field, no_templates] {
            let error = repo.add(&note_type).unwrap_err();
            assert!(matches!(error, Error::InvalidInput(_)), "{note_type:?}");
        }
    }

    #[test]
    fn test_create_note_generates_cards() {
        let db = setup();
        let reversed = db
            .notetypes()
            .by_name("Basic (and reversed card)")
            .unwrap()
            .unwrap();

        let note = db
            .notes()
            .create(&reversed, strings(&["front", "back"]))
            .unwrap();
        let fetched = db.notes().get(note.id).unwrap().unwrap();
        assert_eq!(fetched, note);

        let ords: Vec<usize> = db
            .notes()
            .cards_of(note.id)
            .unwrap()
            .iter()
            .map(|card| card.ord)
            .collect();
        assert_eq!(ords, vec![0, 1]);
    }

    #[test]
    fn test_create_cloze_note_generates_card_per_number() {
        let db = setup();
        let cloze = db.notetypes().by_name("Cloze").unwrap().unwrap();

        let note = db
            .notes()
            .create(&cloze, strings(&["{{c1::a}} {{c3::b}} {{c1::c}}", ""]))
            .unwrap();

        let ords: Vec<usize> = db
            .notes()
            .cards_of(note.id)
            .unwrap()
            .iter()
            .map(|card| card.ord)
            .collect();
        assert_eq!(ords, vec![0, 2]);
    }

    #[test]
    fn test_create_rejects_wrong_field_count() {
        let db = setup();
        let basic = db.notetypes().by_name("Basic").unwrap().unwrap();

        let error = db.notes().create(&basic, strings(&["only one"])).unwrap_err();
        assert!(matches!(error, Error::InvalidInput(_)));
    }

    #[test]
    fn test_list_filters_by_notetype() {
        let db = setup();
        let basic = db.notetypes().by_name("Basic").unwrap().unwrap();
        let cloze = db.notetypes().by_name("Cloze").unwrap().unwrap();

        db.notes().create(&basic, strings(&["a", "b"])).unwrap();
        db.notes().create(&basic, strings(&["c", "d"])).unwrap();
        db.notes().create(&cloze, strings(&["{{c1::e}}", ""])).unwrap();

        assert_eq!(db.notes().list(None).unwrap().len(), 3);
        assert_eq!(db.notes().list(Some(basic.id)).unwrap().len(), 2);
        assert_eq!(db.notes().list(Some(cloze.id)).unwrap().len(), 1);
    }

    #[test]
    fn test_get_missing_note() {
        let db = setup();
        assert!(db.notes().get(NoteId(42)).unwrap().is_none());
    }
}
