//! Change notifications for remapping sessions

use crate::models::{ConversionType, NoteTypeId, SelectedIndex};

/// Published after every successful mutation of a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemapEvent {
    /// A new output note type was selected and both mappings were rebuilt
    OutputNoteTypeChanged {
        note_type_id: NoteTypeId,
        conversion_type: ConversionType,
        discarded_fields: Vec<String>,
        discarded_templates: Vec<String>,
    },
    FieldMappingChanged {
        output_index: usize,
        selection: SelectedIndex,
        discarded_fields: Vec<String>,
    },
    TemplateMappingChanged {
        output_index: usize,
        selection: SelectedIndex,
        discarded_templates: Vec<String>,
    },
    Submitted,
    Cancelled,
}

/// Receives [`RemapEvent`]s from a session it is subscribed to
pub trait RemapObserver {
    fn on_event(&mut self, event: &RemapEvent);
}

impl<F> RemapObserver for F
where
    F: FnMut(&RemapEvent),
{
    fn on_event(&mut self, event: &RemapEvent) {
        self(event);
    }
}
