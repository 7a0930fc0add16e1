use std::io::{self, BufRead, IsTerminal, Write};
use std::path::Path;

use ntmap_core::db::{Database, NoteConversionBackend, NoteTypeRepository};
use ntmap_core::models::{Note, NoteType, NoteTypeId, SelectedIndex};
use ntmap_core::ChangeRequest;
use serde::Serialize;

use crate::error::CliError;

#[derive(Debug, Serialize)]
pub struct NoteTypeListItem {
    pub id: i64,
    pub name: String,
    pub kind: &'static str,
    pub fields: Vec<String>,
    pub templates: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct NoteListItem {
    pub id: i64,
    pub notetype_id: i64,
    pub preview: String,
    pub fields: Vec<String>,
    pub modified: i64,
}

pub fn open_database(path: &Path) -> Result<Database, CliError> {
    tracing::debug!("Using collection {}", path.display());
    Ok(Database::open(path)?)
}

/// Find a note type by exact name first, then by ID
pub fn resolve_notetype(db: &Database, query: &str) -> Result<NoteType, CliError> {
    let repo = db.notetypes();
    if let Some(note_type) = repo.by_name(query)? {
        return Ok(note_type);
    }
    if let Ok(id) = query.parse::<NoteTypeId>() {
        if let Some(note_type) = repo.get(id)? {
            return Ok(note_type);
        }
    }
    Err(CliError::NoteTypeNotFound(query.trim().to_string()))
}

pub fn notetype_to_list_item(note_type: &NoteType) -> NoteTypeListItem {
    NoteTypeListItem {
        id: note_type.id.0,
        name: note_type.name.clone(),
        kind: note_type.kind(),
        fields: note_type.fields.clone(),
        templates: note_type.templates.clone(),
    }
}

pub fn format_notetype_lines(note_types: &[NoteType]) -> Vec<String> {
    note_types
        .iter()
        .map(|note_type| {
            format!(
                "{:<6}  {:<32}  {:<7}  fields: {}  templates: {}",
                note_type.id.0,
                note_type.name,
                note_type.kind(),
                note_type.fields.join(", "),
                note_type.templates.join(", ")
            )
        })
        .collect()
}

pub fn note_to_list_item(note: &Note) -> NoteListItem {
    NoteListItem {
        id: note.id.0,
        notetype_id: note.notetype_id.0,
        preview: note_preview(note, 80),
        fields: note.fields.clone(),
        modified: note.modified,
    }
}

pub fn format_note_lines(notes: &[Note]) -> Vec<String> {
    notes
        .iter()
        .map(|note| {
            let preview = note_preview(note, 40);
            format!("{:<8}  type={:<6}  {preview}", note.id.0, note.notetype_id.0)
        })
        .collect()
}

/// First line of the first field, whitespace collapsed
pub fn note_preview(note: &Note, max_chars: usize) -> String {
    let first_line = note.preview(usize::MAX);
    let collapsed = first_line.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = collapsed.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

/// Split an `OUT=IN` override
pub fn parse_mapping_arg(raw: &str) -> Result<(String, String), CliError> {
    let Some((output, input)) = raw.split_once('=') else {
        return Err(CliError::InvalidMapping(
            raw.to_string(),
            "expected OUT=IN".into(),
        ));
    };
    let (output, input) = (output.trim(), input.trim());
    if output.is_empty() || input.is_empty() {
        return Err(CliError::InvalidMapping(
            raw.to_string(),
            "both sides must be set".into(),
        ));
    }
    Ok((output.to_string(), input.to_string()))
}

/// Resolve a field or template reference: exact name first, then index
pub fn resolve_slot(names: &[String], query: &str) -> Option<usize> {
    names
        .iter()
        .position(|name| name == query)
        .or_else(|| query.parse::<usize>().ok().filter(|index| *index < names.len()))
}

/// Resolve the input side of an override; `none` and `nothing` discard
pub fn resolve_selection(names: &[String], query: &str) -> Option<SelectedIndex> {
    if let Some(index) = resolve_slot(names, query) {
        return Some(SelectedIndex::Source(index));
    }
    let lowered = query.to_lowercase();
    matches!(lowered.as_str(), "none" | "nothing" | "(nothing)").then_some(SelectedIndex::Discard)
}

pub fn parse_confirmation(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Ask the user to accept a one-way sync on an interactive terminal
pub fn prompt_schema_change() -> Result<bool, CliError> {
    let stdin = io::stdin();
    if !stdin.is_terminal() {
        return Err(CliError::ConfirmationRequired);
    }

    ask_schema_change(&mut stdin.lock(), &mut io::stderr())
}

/// Write the one-way sync prompt to `prompt` and read the answer from `input`
pub fn ask_schema_change(
    input: &mut impl BufRead,
    prompt: &mut impl Write,
) -> Result<bool, CliError> {
    write!(
        prompt,
        "This change requires a one-way sync of the collection. Continue? [y/N] "
    )?;
    prompt.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(parse_confirmation(&answer))
}

/// Submit a request, confirming the schema change when the backend asks for it
pub fn submit_change_request<B: NoteConversionBackend>(
    backend: &B,
    request: &ChangeRequest,
    confirm: impl FnOnce() -> Result<bool, CliError>,
) -> Result<usize, CliError> {
    match backend.change_notetype_of_notes(request) {
        Err(ntmap_core::Error::SchemaChangeRequiresConfirmation) => {
            if !confirm()? {
                return Err(CliError::ConfirmationDeclined);
            }
            tracing::info!("Schema change confirmed");
            backend.mod_schema(false)?;
            Ok(backend.change_notetype_of_notes(request)?)
        }
        other => Ok(other?),
    }
}
