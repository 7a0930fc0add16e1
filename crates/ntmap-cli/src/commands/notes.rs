use std::path::Path;

use ntmap_core::db::NoteRepository;

use crate::commands::common::{
    format_note_lines, note_to_list_item, open_database, resolve_notetype, NoteListItem,
};
use crate::error::CliError;

pub fn run_notes(notetype: Option<&str>, as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let db = open_database(db_path)?;
    let filter = notetype
        .map(|query| resolve_notetype(&db, query))
        .transpose()?
        .map(|note_type| note_type.id);
    let notes = db.notes().list(filter)?;

    if as_json {
        let json_items = notes
            .iter()
            .map(note_to_list_item)
            .collect::<Vec<NoteListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else {
        for line in format_note_lines(&notes) {
            println!("{line}");
        }
    }

    Ok(())
}
