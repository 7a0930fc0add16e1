//! Data models for ntmap

mod mapping;
mod note;
mod notetype;

pub use mapping::{FieldMapping, IndexMapping, SelectedIndex, TemplateMapping};
pub use note::{extract_cloze_ordinals, Card, CardId, Note, NoteId};
pub use notetype::{ConversionType, NoteType, NoteTypeId, CLOZE_TEMPLATE_NAME};
