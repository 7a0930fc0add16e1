use std::path::Path;

use ntmap_core::db::NoteTypeRepository;
use ntmap_core::models::{NoteType, NoteTypeId, CLOZE_TEMPLATE_NAME};

use crate::commands::common::open_database;
use crate::error::CliError;

/// Build the note type to insert; the ID is assigned by the collection
pub fn new_notetype(name: &str, fields: &[String], templates: &[String], cloze: bool) -> NoteType {
    let templates = if cloze {
        vec![CLOZE_TEMPLATE_NAME.to_string()]
    } else if templates.is_empty() {
        vec!["Card 1".to_string()]
    } else {
        templates.iter().map(|t| t.trim().to_string()).collect()
    };

    NoteType {
        id: NoteTypeId(0),
        name: name.trim().to_string(),
        fields: fields.iter().map(|f| f.trim().to_string()).collect(),
        templates,
        is_cloze: cloze,
    }
}

pub fn run_add_notetype(
    name: &str,
    fields: &[String],
    templates: &[String],
    cloze: bool,
    db_path: &Path,
) -> Result<(), CliError> {
    let db = open_database(db_path)?;
    let created = db
        .notetypes()
        .add(&new_notetype(name, fields, templates, cloze))?;

    println!("{}", created.id);
    Ok(())
}
