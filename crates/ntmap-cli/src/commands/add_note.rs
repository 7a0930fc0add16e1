use std::path::Path;

use ntmap_core::db::NoteRepository;
use ntmap_core::models::NoteType;

use crate::commands::common::{open_database, resolve_notetype};
use crate::error::CliError;

/// Pad missing trailing fields with empty values
pub fn fill_fields(note_type: &NoteType, values: &[String]) -> Result<Vec<String>, CliError> {
    let expected = note_type.fields.len();
    if values.len() > expected {
        return Err(CliError::TooManyFields(
            note_type.name.clone(),
            expected,
            values.len(),
        ));
    }

    let mut fields = values.to_vec();
    fields.resize(expected, String::new());
    Ok(fields)
}

pub fn run_add_note(notetype: &str, values: &[String], db_path: &Path) -> Result<(), CliError> {
    let db = open_database(db_path)?;
    let note_type = resolve_notetype(&db, notetype)?;
    let note = db.notes().create(&note_type, fill_fields(&note_type, values)?)?;

    println!("{}", note.id);
    Ok(())
}
