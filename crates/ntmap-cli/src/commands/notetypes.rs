use std::path::Path;

use ntmap_core::db::NoteTypeRepository;

use crate::commands::common::{
    format_notetype_lines, notetype_to_list_item, open_database, NoteTypeListItem,
};
use crate::error::CliError;

pub fn run_notetypes(as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let db = open_database(db_path)?;
    let note_types = db.notetypes().all()?;

    if as_json {
        let json_items = note_types
            .iter()
            .map(notetype_to_list_item)
            .collect::<Vec<NoteTypeListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else {
        for line in format_notetype_lines(&note_types) {
            println!("{line}");
        }
    }

    Ok(())
}
