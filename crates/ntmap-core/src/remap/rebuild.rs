//! Default mappings for a freshly selected output note type

use std::collections::BTreeSet;

use crate::models::{FieldMapping, NoteType, SelectedIndex, TemplateMapping};

/// Build the default field mapping from `input` to `output`.
///
/// Fields with identical names are matched first. Every remaining output
/// field, in order, takes the input field at the same index if it is still
/// unused, otherwise the first unused input field. Once every input field is
/// used the remaining outputs are left empty. Exhaustion counts distinct
/// input fields, so outputs sharing a name still leave other inputs to fill.
pub fn rebuild_field_map(input: &NoteType, output: &NoteType) -> FieldMapping {
    let mut entries: Vec<Option<SelectedIndex>> = output
        .fields
        .iter()
        .map(|name| input.field_index(name).map(SelectedIndex::Source))
        .collect();

    let mut used: BTreeSet<usize> = entries.iter().flatten().filter_map(|e| e.source()).collect();
    let input_count = input.fields.len();

    for output_index in 0..entries.len() {
        if entries[output_index].is_some() {
            continue;
        }

        let selection = if used.len() >= input_count {
            SelectedIndex::Discard
        } else if !used.contains(&output_index) && output_index < input_count {
            SelectedIndex::Source(output_index)
        } else {
            (0..input_count)
                .find(|index| !used.contains(index))
                .map_or(SelectedIndex::Discard, SelectedIndex::Source)
        };

        if let SelectedIndex::Source(index) = selection {
            used.insert(index);
        }
        entries[output_index] = Some(selection);
    }

    FieldMapping::new(
        entries
            .into_iter()
            .map(|entry| entry.unwrap_or(SelectedIndex::Discard))
            .collect(),
    )
}

/// Build the default template mapping: output `i` inherits from input `i`
/// when the input has that many templates.
pub fn rebuild_template_map(input: &NoteType, output: &NoteType) -> TemplateMapping {
    TemplateMapping::new(
        (0..output.templates.len())
            .map(|index| {
                if index < input.templates.len() {
                    SelectedIndex::Source(index)
                } else {
                    SelectedIndex::Discard
                }
            })
            .collect(),
    )
}
