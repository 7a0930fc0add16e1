//! Serializable session state, for restoring a session after a restart

use serde::{Deserialize, Serialize};

use crate::models::{FieldMapping, NoteId, NoteTypeId, TemplateMapping};

/// The user-modifiable part of a remapping session.
///
/// Input and available note types are not stored: they are reloaded from the
/// collection on restore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemapSnapshot {
    pub note_ids: Vec<NoteId>,
    #[serde(default)]
    pub output_note_type_id: Option<NoteTypeId>,
    #[serde(default)]
    pub field_mapping: Option<FieldMapping>,
    #[serde(default)]
    pub template_mapping: Option<TemplateMapping>,
}

impl RemapSnapshot {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SelectedIndex;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_minimal_snapshot() {
        let snapshot = RemapSnapshot::from_json(r#"{"note_ids":[1,2]}"#).unwrap();
        assert_eq!(snapshot.note_ids, vec![NoteId(1), NoteId(2)]);
        assert_eq!(snapshot.output_note_type_id, None);
        assert_eq!(snapshot.field_mapping, None);
    }

    #[test]
    fn json_uses_null_for_discarded_entries() {
        let snapshot = RemapSnapshot {
            note_ids: vec![NoteId(7)],
            output_note_type_id: Some(NoteTypeId(3)),
            field_mapping: Some(FieldMapping::new(vec![
                SelectedIndex::Source(1),
                SelectedIndex::Discard,
            ])),
            template_mapping: Some(TemplateMapping::identity(1)),
        };

        let json = snapshot.to_json().unwrap();
        assert!(json.contains(r#""field_mapping":[1,null]"#));
        assert_eq!(RemapSnapshot::from_json(&json).unwrap(), snapshot);
    }
}
