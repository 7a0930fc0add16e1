//! Applying change requests to stored notes and cards

use std::collections::BTreeSet;

use rusqlite::{params, Connection};

use super::repository::{
    NoteRepository, NoteTypeRepository, SqliteNoteRepository, SqliteNoteTypeRepository,
};
use super::schema;
use crate::error::{Error, Result};
use crate::models::{NoteId, NoteType, NoteTypeId};
use crate::remap::ChangeRequest;
use crate::util::{first_duplicate, unix_millis_now};

/// Storage side of a note type change
pub trait NoteConversionBackend {
    /// `true` if the schema was already modified since the last sync
    fn schema_changed(&self) -> Result<bool>;

    /// Mark the schema as modified.
    ///
    /// With `check`, fails with
    /// [`Error::SchemaChangeRequiresConfirmation`] unless the schema was
    /// already modified since the last sync.
    fn mod_schema(&self, check: bool) -> Result<()>;

    /// Convert the notes of `request`, returning the number of notes changed.
    ///
    /// Requires the schema gate to be open; confirm with
    /// `mod_schema(false)` and retry on
    /// [`Error::SchemaChangeRequiresConfirmation`].
    fn change_notetype_of_notes(&self, request: &ChangeRequest) -> Result<usize>;
}

/// `SQLite` implementation of `NoteConversionBackend`
pub struct SqliteConversionBackend<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteConversionBackend<'a> {
    /// Create a new backend with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn load_notetype(&self, id: NoteTypeId) -> Result<NoteType> {
        SqliteNoteTypeRepository::new(self.conn)
            .get(id)?
            .ok_or_else(|| Error::NotFound(format!("note type {id}")))
    }
}

/// Check a request against the note types it converts between
fn validate(request: &ChangeRequest, source: &NoteType, target: &NoteType) -> Result<()> {
    if request.note_ids.is_empty() {
        return Err(Error::InvalidInput("note ids were empty".into()));
    }
    if let Some(duplicate) = first_duplicate(&request.note_ids) {
        return Err(Error::InvalidInput(format!(
            "note ids were not distinct ({duplicate} repeated)"
        )));
    }
    if request.field_mapping.len() != target.fields.len() {
        return Err(Error::InvalidInput(format!(
            "field mapping has {} entries, '{}' has {} fields",
            request.field_mapping.len(),
            target.name,
            target.fields.len()
        )));
    }
    if let Some(source_index) = request
        .field_mapping
        .used_sources()
        .into_iter()
        .find(|index| *index >= source.fields.len())
    {
        return Err(Error::InvalidInput(format!(
            "field mapping refers to missing field {source_index} of '{}'",
            source.name
        )));
    }

    let regular = !source.is_cloze && !target.is_cloze;
    match &request.template_mapping {
        None if regular => Err(Error::InvalidInput(
            "a template mapping is required between regular note types".into(),
        )),
        None => Ok(()),
        Some(_) if !regular => Err(Error::InvalidInput(
            "templates cannot be mapped when a cloze note type is involved".into(),
        )),
        Some(mapping) => {
            if mapping.len() != target.templates.len() {
                return Err(Error::InvalidInput(format!(
                    "template mapping has {} entries, '{}' has {} templates",
                    mapping.len(),
                    target.name,
                    target.templates.len()
                )));
            }
            let used = mapping.used_sources();
            let mapped = mapping.iter().filter(|(_, entry)| !entry.is_discard()).count();
            if used.len() != mapped {
                return Err(Error::InvalidInput(
                    "a template was mapped more than once".into(),
                ));
            }
            if used.iter().any(|index| *index >= source.templates.len()) {
                return Err(Error::InvalidInput(format!(
                    "template mapping refers to a missing template of '{}'",
                    source.name
                )));
            }
            Ok(())
        }
    }
}

/// Rewrite one note and its cards inside the open transaction
fn convert_note(
    conn: &Connection,
    note_id: NoteId,
    request: &ChangeRequest,
    source: &NoteType,
    target: &NoteType,
) -> Result<()> {
    let notes = SqliteNoteRepository::new(conn);
    let note = notes
        .get(note_id)?
        .ok_or_else(|| Error::NotFound(format!("note {note_id}")))?;
    if note.notetype_id != source.id {
        return Err(Error::InvalidInput(format!(
            "note {note_id} has note type {}, expected {}",
            note.notetype_id, source.id
        )));
    }

    let fields: Vec<String> = request
        .field_mapping
        .iter()
        .map(|(_, selection)| {
            selection
                .source()
                .and_then(|index| note.fields.get(index).cloned())
                .unwrap_or_default()
        })
        .collect();

    conn.execute(
        "UPDATE notes SET notetype_id = ?, fields = ?, modified = ? WHERE id = ?",
        params![
            target.id.0,
            serde_json::to_string(&fields)?,
            unix_millis_now(),
            note_id.0
        ],
    )?;

    let wanted = target.card_ordinals(&fields);
    let mut present = BTreeSet::new();
    for card in notes.cards_of(note_id)? {
        let new_ord = match &request.template_mapping {
            Some(mapping) => mapping.output_for_source(card.ord),
            None => wanted.contains(&card.ord).then_some(card.ord),
        };

        match new_ord {
            Some(ord) if present.insert(ord) => {
                if ord != card.ord {
                    conn.execute(
                        "UPDATE cards SET ord = ? WHERE id = ?",
                        params![ord, card.id.0],
                    )?;
                }
            }
            _ => {
                conn.execute("DELETE FROM cards WHERE id = ?", params![card.id.0])?;
            }
        }
    }

    for ord in wanted.difference(&present) {
        notes.add_card(note_id, *ord)?;
    }

    Ok(())
}

impl NoteConversionBackend for SqliteConversionBackend<'_> {
    fn schema_changed(&self) -> Result<bool> {
        schema::schema_changed(self.conn)
    }

    fn mod_schema(&self, check: bool) -> Result<()> {
        schema::mod_schema(self.conn, check)
    }

    fn change_notetype_of_notes(&self, request: &ChangeRequest) -> Result<usize> {
        let source = self.load_notetype(request.source_id)?;
        let target = self.load_notetype(request.target_id)?;
        validate(request, &source, &target)?;

        self.mod_schema(true)?;

        let tx = self.conn.unchecked_transaction()?;
        for note_id in &request.note_ids {
            convert_note(&tx, *note_id, request, &source, &target)?;
        }
        tx.commit()?;

        tracing::info!(
            "Changed note type of {} notes from '{}' to '{}'",
            request.note_ids.len(),
            source.name,
            target.name
        );
        Ok(request.note_ids.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::{Card, FieldMapping, Note, SelectedIndex, TemplateMapping};
    use crate::remap::NoteTypeRemapper;
    use pretty_assertions::assert_eq;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    fn notetype(db: &Database, name: &str) -> NoteType {
        db.notetypes().by_name(name).unwrap().unwrap()
    }

    fn add_note(db: &Database, name: &str, fields: &[&str]) -> Note {
        db.notes()
            .create(&notetype(db, name), strings(fields))
            .unwrap()
    }

    fn session(db: &Database, notes: &[&Note]) -> NoteTypeRemapper {
        NoteTypeRemapper::load(
            &db.notetypes(),
            &db.notes(),
            notes.iter().map(|note| note.id).collect(),
        )
        .unwrap()
    }

    fn ords(cards: &[Card]) -> Vec<usize> {
        cards.iter().map(|card| card.ord).collect()
    }

    /// Convert through a session, confirming the schema change like a user would
    fn convert(db: &Database, mut remapper: NoteTypeRemapper) -> usize {
        let request = remapper.build_change_request().unwrap();
        let backend = db.conversion_backend();
        match backend.change_notetype_of_notes(&request) {
            Err(Error::SchemaChangeRequiresConfirmation) => {
                backend.mod_schema(false).unwrap();
                backend.change_notetype_of_notes(&request).unwrap()
            }
            other => other.unwrap(),
        }
    }

    #[test]
    fn basic_to_optional_reversed_keeps_fields() {
        let db = Database::open_in_memory().unwrap();
        let note = add_note(&db, "Basic", &["front", "back"]);

        let mut remapper = session(&db, &[&note]);
        remapper
            .set_output_note_type(notetype(&db, "Basic (optional reversed card)"))
            .unwrap();

        let request = remapper.build_change_request().unwrap();
        assert_eq!(request.field_mapping.to_ordinals(), vec![0, 1, -1]);
        assert_eq!(
            request.template_mapping.as_ref().map(TemplateMapping::to_ordinals),
            Some(vec![0, -1])
        );

        assert_eq!(db.conversion_backend().change_notetype_of_notes(&request).unwrap(), 1);

        let converted = db.notes().get(note.id).unwrap().unwrap();
        assert_eq!(converted.fields, strings(&["front", "back", ""]));
        assert_eq!(
            converted.notetype_id,
            notetype(&db, "Basic (optional reversed card)").id
        );
    }

    #[test]
    fn regular_to_cloze_generates_card_per_cloze_number() {
        let db = Database::open_in_memory().unwrap();
        let note = add_note(&db, "Basic", &["{{c1::test}} {{c2::more}}", "back"]);

        let mut remapper = session(&db, &[&note]);
        remapper
            .set_output_note_type(notetype(&db, "Cloze"))
            .unwrap();
        convert(&db, remapper);

        let cards = db.notes().cards_of(note.id).unwrap();
        assert_eq!(ords(&cards), vec![0, 1]);
    }

    #[test]
    fn cloze_to_reversed_generates_both_cards() {
        let db = Database::open_in_memory().unwrap();
        let note = add_note(&db, "Cloze", &["{{c1::test}}", "extra"]);

        let mut remapper = session(&db, &[&note]);
        remapper
            .set_output_note_type(notetype(&db, "Basic (and reversed card)"))
            .unwrap();
        convert(&db, remapper);

        let cards = db.notes().cards_of(note.id).unwrap();
        assert_eq!(ords(&cards), vec![0, 1]);
    }

    #[test]
    fn cloze_to_cloze_retains_cards() {
        let db = Database::open_in_memory().unwrap();
        let other_cloze = db
            .notetypes()
            .add(&NoteType::cloze(
                NoteTypeId(0),
                "Cloze Copy",
                &["Text", "Back Extra"],
            ))
            .unwrap();
        let note = add_note(&db, "Cloze", &["{{c1::a}} {{c2::b}}", ""]);
        let before = db.notes().cards_of(note.id).unwrap();

        let mut remapper = session(&db, &[&note]);
        remapper.set_output_note_type(other_cloze).unwrap();
        convert(&db, remapper);

        let after = db.notes().cards_of(note.id).unwrap();
        assert_eq!(after, before);
    }

    #[test]
    fn swapped_templates_keep_scheduling() {
        let db = Database::open_in_memory().unwrap();
        let note = add_note(&db, "Basic (and reversed card)", &["front", "back"]);
        db.connection()
            .execute(
                "UPDATE cards SET reps = 5, interval = 12 WHERE note_id = ? AND ord = 0",
                params![note.id.0],
            )
            .unwrap();
        let reviewed = db.notes().cards_of(note.id).unwrap()[0].id;

        let mut remapper = session(&db, &[&note]);
        remapper
            .update_template_mapping(0, SelectedIndex::Source(1))
            .unwrap();
        remapper
            .update_template_mapping(1, SelectedIndex::Source(0))
            .unwrap();
        convert(&db, remapper);

        let cards = db.notes().cards_of(note.id).unwrap();
        assert_eq!(ords(&cards), vec![0, 1]);
        let moved = cards.iter().find(|card| card.id == reviewed).unwrap();
        assert_eq!(moved.ord, 1);
        assert_eq!(moved.reps, 5);
        assert_eq!(moved.interval, 12);
    }

    #[test]
    fn discarding_both_templates_does_not_fail() {
        let db = Database::open_in_memory().unwrap();
        let note = add_note(&db, "Basic (and reversed card)", &["front", "back"]);
        let old_ids: Vec<_> = db
            .notes()
            .cards_of(note.id)
            .unwrap()
            .iter()
            .map(|card| card.id)
            .collect();

        let mut remapper = session(&db, &[&note]);
        remapper
            .update_template_mapping(0, SelectedIndex::Discard)
            .unwrap();
        remapper
            .update_template_mapping(1, SelectedIndex::Discard)
            .unwrap();
        convert(&db, remapper);

        // Old cards are gone, replaced by fresh ones for every template
        let cards = db.notes().cards_of(note.id).unwrap();
        assert_eq!(ords(&cards), vec![0, 1]);
        assert!(cards.iter().all(|card| !old_ids.contains(&card.id)));
        assert!(cards.iter().all(|card| card.reps == 0));
    }

    #[test]
    fn conversion_requires_confirmation_after_sync() {
        let db = Database::open_in_memory().unwrap();
        let note = add_note(&db, "Basic", &["front", "back"]);
        db.mark_synced().unwrap();

        let mut remapper = session(&db, &[&note]);
        remapper
            .set_output_note_type(notetype(&db, "Basic (and reversed card)"))
            .unwrap();
        let request = remapper.build_change_request().unwrap();

        let backend = db.conversion_backend();
        let error = backend.change_notetype_of_notes(&request).unwrap_err();
        assert!(matches!(error, Error::SchemaChangeRequiresConfirmation));
        assert_eq!(
            db.notes().get(note.id).unwrap().unwrap().notetype_id,
            notetype(&db, "Basic").id
        );

        backend.mod_schema(false).unwrap();
        assert_eq!(backend.change_notetype_of_notes(&request).unwrap(), 1);
        assert!(backend.schema_changed().unwrap());
    }

    #[test]
    fn converts_several_notes_atomically() {
        let db = Database::open_in_memory().unwrap();
        let first = add_note(&db, "Basic", &["a", "b"]);
        let second = add_note(&db, "Basic", &["c", "d"]);

        let mut remapper = session(&db, &[&first, &second]);
        remapper
            .set_output_note_type(notetype(&db, "Basic (and reversed card)"))
            .unwrap();
        let mut request = remapper.build_change_request().unwrap();
        request.note_ids.push(NoteId(9999));

        let error = db
            .conversion_backend()
            .change_notetype_of_notes(&request)
            .unwrap_err();
        assert!(matches!(error, Error::NotFound(_)));

        // Nothing was converted
        for note in [&first, &second] {
            let stored = db.notes().get(note.id).unwrap().unwrap();
            assert_eq!(stored.notetype_id, notetype(&db, "Basic").id);
            assert_eq!(db.notes().cards_of(note.id).unwrap().len(), 1);
        }
    }

    #[test]
    fn rejects_mismatched_mappings() {
        let db = Database::open_in_memory().unwrap();
        let note = add_note(&db, "Basic", &["a", "b"]);
        let basic = notetype(&db, "Basic");
        let cloze = notetype(&db, "Cloze");

        let mut request = ChangeRequest {
            source_id: basic.id,
            target_id: cloze.id,
            note_ids: vec![note.id],
            field_mapping: FieldMapping::identity(2),
            template_mapping: Some(TemplateMapping::identity(1)),
        };
        let backend = db.conversion_backend();
        assert!(matches!(
            backend.change_notetype_of_notes(&request),
            Err(Error::InvalidInput(_))
        ));

        request.template_mapping = None;
        request.field_mapping = FieldMapping::identity(3);
        assert!(matches!(
            backend.change_notetype_of_notes(&request),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn rejects_repeated_note_ids() {
        let db = Database::open_in_memory().unwrap();
        let note = add_note(&db, "Basic", &["front", "back"]);
        let basic = notetype(&db, "Basic");

        let request = ChangeRequest {
            source_id: basic.id,
            target_id: basic.id,
            note_ids: vec![note.id, note.id],
            field_mapping: FieldMapping::new(vec![
                SelectedIndex::Source(1),
                SelectedIndex::Source(0),
            ]),
            template_mapping: Some(TemplateMapping::identity(1)),
        };
        assert!(matches!(
            db.conversion_backend().change_notetype_of_notes(&request),
            Err(Error::InvalidInput(_))
        ));

        let unchanged = db.notes().get(note.id).unwrap().unwrap();
        assert_eq!(unchanged.fields, strings(&["front", "back"]));
    }

    #[test]
    fn regular_to_cloze_keeps_scheduling_of_generated_cards() {
        let db = Database::open_in_memory().unwrap();
        let note = add_note(&db, "Basic (and reversed card)", &["{{c1::only}}", "back"]);
        db.connection()
            .execute(
                "UPDATE cards SET reps = 3, interval = 7 WHERE note_id = ? AND ord = 0",
                params![note.id.0],
            )
            .unwrap();
        let reviewed = db.notes().cards_of(note.id).unwrap()[0].id;

        let mut remapper = session(&db, &[&note]);
        remapper
            .set_output_note_type(notetype(&db, "Cloze"))
            .unwrap();
        assert!(remapper
            .conversion_type()
            .warning()
            .is_some_and(|warning| warning.contains("keep their scheduling")));
        convert(&db, remapper);

        let cards = db.notes().cards_of(note.id).unwrap();
        assert_eq!(ords(&cards), vec![0]);
        assert_eq!(cards[0].id, reviewed);
        assert_eq!(cards[0].reps, 3);
        assert_eq!(cards[0].interval, 7);
    }
}
