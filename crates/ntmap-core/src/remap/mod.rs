//! Note type remapping sessions
//!
//! A [`NoteTypeRemapper`] holds the state of one bulk "change note type"
//! operation: the note type the notes currently have, the note type the user
//! selected, and for every field and template of the selected type the source
//! it inherits from. It never touches storage; the resulting
//! [`ChangeRequest`] is handed to a
//! [`NoteConversionBackend`](crate::db::NoteConversionBackend).

mod observer;
mod rebuild;
mod request;
mod snapshot;

use std::fmt;

use crate::db::{NoteRepository, NoteTypeRepository};
use crate::error::{Error, Result};
use crate::models::{
    ConversionType, FieldMapping, NoteId, NoteType, NoteTypeId, SelectedIndex, TemplateMapping,
};
use crate::util::first_duplicate;

pub use observer::{RemapEvent, RemapObserver};
pub use rebuild::{rebuild_field_map, rebuild_template_map};
pub use request::ChangeRequest;
pub use snapshot::RemapSnapshot;

/// Lifecycle of a remapping session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Editing,
    Submitted,
    Cancelled,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Editing => "editing",
            Self::Submitted => "submitted",
            Self::Cancelled => "cancelled",
        };
        f.write_str(label)
    }
}

/// Interactive state for converting notes from one note type to another
pub struct NoteTypeRemapper {
    /// Non-empty and distinct
    note_ids: Vec<NoteId>,
    input: NoteType,
    /// Sorted by name
    available: Vec<NoteType>,
    output: NoteType,
    field_mapping: FieldMapping,
    template_mapping: TemplateMapping,
    state: SessionState,
    observers: Vec<Box<dyn RemapObserver>>,
}

impl fmt::Debug for NoteTypeRemapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NoteTypeRemapper")
            .field("note_ids", &self.note_ids)
            .field("input", &self.input.id)
            .field("output", &self.output.id)
            .field("field_mapping", &self.field_mapping)
            .field("template_mapping", &self.template_mapping)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl NoteTypeRemapper {
    /// Start a session converting `note_ids`, whose note type is `input`.
    ///
    /// The output note type starts out as `input`. `available` is the list of
    /// note types [`Self::set_output_note_type_id`] may select from.
    pub fn new(input: NoteType, available: Vec<NoteType>, note_ids: Vec<NoteId>) -> Result<Self> {
        validate_note_ids(&note_ids)?;
        if input.fields.is_empty() {
            return Err(Error::InvalidInput(format!(
                "note type '{}' has no fields",
                input.name
            )));
        }

        let mut available = available;
        if !available.iter().any(|nt| nt.id == input.id) {
            available.push(input.clone());
        }
        available.sort_by_key(|nt| nt.name.to_lowercase());

        let field_mapping = rebuild_field_map(&input, &input);
        let template_mapping = rebuild_template_map(&input, &input);

        Ok(Self {
            note_ids,
            output: input.clone(),
            input,
            available,
            field_mapping,
            template_mapping,
            state: SessionState::Editing,
            observers: Vec::new(),
        })
    }

    /// Start a session from the collection.
    ///
    /// The input note type is the note type of the first note; all notes must
    /// share it.
    pub fn load(
        notetypes: &impl NoteTypeRepository,
        notes: &impl NoteRepository,
        note_ids: Vec<NoteId>,
    ) -> Result<Self> {
        validate_note_ids(&note_ids)?;

        let mut input_id: Option<NoteTypeId> = None;
        for id in &note_ids {
            let note = notes
                .get(*id)?
                .ok_or_else(|| Error::NotFound(format!("note {id}")))?;
            match input_id {
                None => input_id = Some(note.notetype_id),
                Some(expected) if expected != note.notetype_id => {
                    return Err(Error::InvalidInput(format!(
                        "notes have different note types ({expected} and {})",
                        note.notetype_id
                    )));
                }
                Some(_) => {}
            }
        }

        let input_id = input_id.ok_or_else(|| Error::InvalidInput("no notes given".into()))?;
        let input = notetypes
            .get(input_id)?
            .ok_or_else(|| Error::NotFound(format!("note type {input_id}")))?;
        let available = notetypes.all()?;

        Self::new(input, available, note_ids)
    }

    /// Rebuild a session from a snapshot taken by [`Self::snapshot`].
    ///
    /// An unknown output note type falls back to `input`. Stored mappings are
    /// only reused when they fit the restored output note type; otherwise both
    /// are rebuilt.
    pub fn restore(
        snapshot: RemapSnapshot,
        input: NoteType,
        available: Vec<NoteType>,
    ) -> Result<Self> {
        let mut session = Self::new(input, available, snapshot.note_ids)?;

        if let Some(id) = snapshot.output_note_type_id {
            if id != session.input.id {
                if let Some(output) = session.find_available(id).cloned() {
                    tracing::debug!("Restoring output note type {}", id);
                    session.replace_output(output);
                } else {
                    tracing::warn!("Output note type {} no longer exists, using input", id);
                }
            }
        }

        match (snapshot.field_mapping, snapshot.template_mapping) {
            (Some(fields), Some(templates))
                if session.fits_output(&fields, &templates) =>
            {
                tracing::debug!("Mappings restored from snapshot");
                session.field_mapping = fields;
                session.template_mapping = templates;
            }
            _ => tracing::debug!("Initializing mappings"),
        }

        Ok(session)
    }

    /// Capture the user-modifiable state of the session
    pub fn snapshot(&self) -> RemapSnapshot {
        RemapSnapshot {
            note_ids: self.note_ids.clone(),
            output_note_type_id: Some(self.output.id),
            field_mapping: Some(self.field_mapping.clone()),
            template_mapping: Some(self.template_mapping.clone()),
        }
    }

    /// Register an observer notified after every successful mutation
    pub fn subscribe(&mut self, observer: impl RemapObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn note_ids(&self) -> &[NoteId] {
        &self.note_ids
    }

    /// The number of notes the change will affect
    pub fn note_count(&self) -> usize {
        self.note_ids.len()
    }

    pub const fn input_note_type(&self) -> &NoteType {
        &self.input
    }

    pub const fn output_note_type(&self) -> &NoteType {
        &self.output
    }

    pub fn available_note_types(&self) -> &[NoteType] {
        &self.available
    }

    pub const fn field_mapping(&self) -> &FieldMapping {
        &self.field_mapping
    }

    pub const fn template_mapping(&self) -> &TemplateMapping {
        &self.template_mapping
    }

    pub const fn state(&self) -> SessionState {
        self.state
    }

    pub const fn conversion_type(&self) -> ConversionType {
        ConversionType::from_note_type_change(&self.input, &self.output)
    }

    /// Whether [`Self::update_template_mapping`] may be called
    pub const fn can_change_templates(&self) -> bool {
        self.conversion_type().allows_template_mapping()
    }

    /// Names of input fields whose content will be dropped
    pub fn discarded_fields(&self) -> Vec<String> {
        self.field_mapping.discarded_names(&self.input.fields)
    }

    /// Names of input templates whose cards will be removed.
    ///
    /// Empty when a cloze note type is involved, as templates are not mapped.
    pub fn discarded_templates(&self) -> Vec<String> {
        if !self.can_change_templates() {
            return Vec::new();
        }
        self.template_mapping.discarded_names(&self.input.templates)
    }

    /// Select a new output note type, resetting both mappings
    pub fn set_output_note_type(&mut self, note_type: NoteType) -> Result<()> {
        self.ensure_editing()?;
        tracing::info!(
            "Updating selected note type to '{}' ({})",
            note_type.name,
            note_type.id
        );
        self.replace_output(note_type);

        let event = RemapEvent::OutputNoteTypeChanged {
            note_type_id: self.output.id,
            conversion_type: self.conversion_type(),
            discarded_fields: self.discarded_fields(),
            discarded_templates: self.discarded_templates(),
        };
        self.notify(&event);
        Ok(())
    }

    /// Select one of the available note types by id, resetting both mappings
    pub fn set_output_note_type_id(&mut self, id: NoteTypeId) -> Result<()> {
        let note_type = self
            .find_available(id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("note type {id}")))?;
        self.set_output_note_type(note_type)
    }

    /// Choose which input field output field `output_index` copies from.
    ///
    /// Several output fields may copy the same input field.
    pub fn update_field_mapping(
        &mut self,
        output_index: usize,
        selection: SelectedIndex,
    ) -> Result<()> {
        self.ensure_editing()?;
        check_index("output field", output_index, self.output.fields.len())?;
        if let SelectedIndex::Source(source) = selection {
            check_index("input field", source, self.input.fields.len())?;
        }

        tracing::debug!("Updating field mapping: '{}' -> '{}'", output_index, selection);
        self.field_mapping.set(output_index, selection);

        let event = RemapEvent::FieldMappingChanged {
            output_index,
            selection,
            discarded_fields: self.discarded_fields(),
        };
        self.notify(&event);
        Ok(())
    }

    /// Choose which input template output template `output_index` inherits
    /// cards from. An input template is used at most once: a previous holder
    /// of `selection` is reset to nothing.
    ///
    /// # Panics
    ///
    /// Panics unless both note types are regular; see
    /// [`Self::can_change_templates`].
    pub fn update_template_mapping(
        &mut self,
        output_index: usize,
        selection: SelectedIndex,
    ) -> Result<()> {
        self.ensure_editing()?;
        assert!(
            self.can_change_templates(),
            "changing templates was disabled ({})",
            self.conversion_type()
        );
        check_index("output template", output_index, self.output.templates.len())?;

        if let SelectedIndex::Source(source) = selection {
            check_index("input template", source, self.input.templates.len())?;

            let holders: Vec<usize> = self
                .template_mapping
                .iter()
                .filter(|(index, entry)| {
                    *index != output_index && *entry == SelectedIndex::Source(source)
                })
                .map(|(index, _)| index)
                .collect();
            debug_assert!(holders.len() <= 1, "a template was mapped multiple times");
            for holder in holders {
                self.template_mapping.set(holder, SelectedIndex::Discard);
            }
        }

        tracing::debug!("Updating template mapping: {} -> {}", output_index, selection);
        self.template_mapping.set(output_index, selection);

        let event = RemapEvent::TemplateMappingChanged {
            output_index,
            selection,
            discarded_templates: self.discarded_templates(),
        };
        self.notify(&event);
        Ok(())
    }

    /// Materialize the session into a [`ChangeRequest`] and close it.
    ///
    /// Fails with [`Error::NoChanges`] when the output note type is the input
    /// note type and neither mapping was changed; the session stays editable.
    pub fn build_change_request(&mut self) -> Result<ChangeRequest> {
        self.ensure_editing()?;

        let request = ChangeRequest {
            source_id: self.input.id,
            target_id: self.output.id,
            note_ids: self.note_ids.clone(),
            field_mapping: self.field_mapping.clone(),
            template_mapping: self
                .can_change_templates()
                .then(|| self.template_mapping.clone()),
        };

        if request.is_noop() {
            tracing::info!("Change note type: no changes to save");
            return Err(Error::NoChanges);
        }

        tracing::debug!(
            "Changing note type from '{}' to '{}'",
            self.input.name,
            self.output.name
        );
        tracing::debug!("Field map: {}", request.field_mapping);
        if let Some(templates) = &request.template_mapping {
            tracing::debug!("Template map: {}", templates);
        }

        self.state = SessionState::Submitted;
        self.notify(&RemapEvent::Submitted);
        Ok(request)
    }

    /// Abandon the session
    pub fn cancel(&mut self) -> Result<()> {
        self.ensure_editing()?;
        self.state = SessionState::Cancelled;
        self.notify(&RemapEvent::Cancelled);
        Ok(())
    }

    fn replace_output(&mut self, note_type: NoteType) {
        self.field_mapping = rebuild_field_map(&self.input, &note_type);
        self.template_mapping = rebuild_template_map(&self.input, &note_type);
        self.output = note_type;
    }

    fn find_available(&self, id: NoteTypeId) -> Option<&NoteType> {
        self.available.iter().find(|nt| nt.id == id)
    }

    fn fits_output(&self, fields: &FieldMapping, templates: &TemplateMapping) -> bool {
        let in_range = |mapping: &FieldMapping, inputs: usize| {
            mapping.used_sources().iter().all(|source| *source < inputs)
        };
        let templates_unique = templates.used_sources().len()
            == templates.iter().filter(|(_, e)| !e.is_discard()).count();

        fields.len() == self.output.fields.len()
            && templates.len() == self.output.templates.len()
            && in_range(fields, self.input.fields.len())
            && in_range(templates, self.input.templates.len())
            && templates_unique
    }

    fn ensure_editing(&self) -> Result<()> {
        match self.state {
            SessionState::Editing => Ok(()),
            state => Err(Error::SessionClosed(state)),
        }
    }

    fn notify(&mut self, event: &RemapEvent) {
        for observer in &mut self.observers {
            observer.on_event(event);
        }
    }
}

fn validate_note_ids(note_ids: &[NoteId]) -> Result<()> {
    if note_ids.is_empty() {
        return Err(Error::InvalidInput("note ids were empty".into()));
    }
    if let Some(duplicate) = first_duplicate(note_ids) {
        return Err(Error::InvalidInput(format!(
            "note ids were not distinct ({duplicate} repeated)"
        )));
    }
    Ok(())
}

fn check_index(what: &str, index: usize, len: usize) -> Result<()> {
    if index < len {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!(
            "{what} index {index} out of range (0..{len})"
        )))
    }
}
