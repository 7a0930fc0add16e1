//! The materialized result of a remapping session

use serde::{Deserialize, Serialize};

use crate::models::{FieldMapping, NoteId, NoteTypeId, TemplateMapping};

/// Everything a conversion backend needs to change the note type of notes.
///
/// Indices in both mappings are relative to the target note type; values
/// point into the source note type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRequest {
    pub source_id: NoteTypeId,
    pub target_id: NoteTypeId,
    pub note_ids: Vec<NoteId>,
    pub field_mapping: FieldMapping,
    /// `None` when either note type is cloze
    pub template_mapping: Option<TemplateMapping>,
}

impl ChangeRequest {
    /// True when applying the request would leave the notes as they are
    pub fn is_noop(&self) -> bool {
        if self.source_id != self.target_id {
            return false;
        }
        if self.field_mapping != FieldMapping::identity(self.field_mapping.len()) {
            return false;
        }
        self.template_mapping
            .as_ref()
            .is_none_or(|mapping| *mapping == TemplateMapping::identity(mapping.len()))
    }
}
