use std::path::Path;

use ntmap_core::models::{ConversionType, IndexMapping, NoteId};
use ntmap_core::NoteTypeRemapper;
use serde::Serialize;

use crate::cli::ChangeArgs;
use crate::commands::common::{
    open_database, parse_mapping_arg, prompt_schema_change, resolve_notetype, resolve_selection,
    resolve_slot, submit_change_request,
};
use crate::error::CliError;

const NOTHING: &str = "(nothing)";

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct PlanEntry {
    pub output: String,
    /// `None` when the output slot starts empty
    pub source: Option<String>,
}

/// What a session is about to do, for review before submitting
#[derive(Debug, Serialize)]
pub struct ConversionPlan {
    pub note_count: usize,
    pub input: String,
    pub output: String,
    pub conversion: ConversionType,
    pub fields: Vec<PlanEntry>,
    /// Absent when a cloze note type is involved
    pub templates: Option<Vec<PlanEntry>>,
    pub discarded_fields: Vec<String>,
    pub discarded_templates: Vec<String>,
    pub warning: Option<&'static str>,
}

impl ConversionPlan {
    pub fn from_session(remapper: &NoteTypeRemapper) -> Self {
        let input = remapper.input_note_type();
        let output = remapper.output_note_type();
        let conversion = remapper.conversion_type();

        Self {
            note_count: remapper.note_count(),
            input: input.name.clone(),
            output: output.name.clone(),
            conversion,
            fields: plan_entries(remapper.field_mapping(), &output.fields, &input.fields),
            templates: remapper.can_change_templates().then(|| {
                plan_entries(
                    remapper.template_mapping(),
                    &output.templates,
                    &input.templates,
                )
            }),
            discarded_fields: remapper.discarded_fields(),
            discarded_templates: remapper.discarded_templates(),
            warning: conversion.warning(),
        }
    }
}

fn plan_entries(mapping: &IndexMapping, outputs: &[String], inputs: &[String]) -> Vec<PlanEntry> {
    mapping
        .iter()
        .map(|(index, selection)| PlanEntry {
            output: outputs.get(index).cloned().unwrap_or_default(),
            source: selection.source().and_then(|source| inputs.get(source).cloned()),
        })
        .collect()
}

pub fn format_plan_lines(plan: &ConversionPlan) -> Vec<String> {
    let mut lines = vec![format!(
        "Change note type of {} note(s): {} -> {} ({})",
        plan.note_count, plan.input, plan.output, plan.conversion
    )];

    let mut section = |title: &str, entries: &[PlanEntry]| {
        lines.push(format!("{title}:"));
        let width = entries.iter().map(|e| e.output.chars().count()).max().unwrap_or(0);
        for entry in entries {
            let source = entry.source.as_deref().unwrap_or(NOTHING);
            lines.push(format!("  {:<width$}  <- {source}", entry.output));
        }
    };
    section("Fields", &plan.fields);
    if let Some(templates) = &plan.templates {
        section("Templates", templates);
    }

    if !plan.discarded_fields.is_empty() {
        lines.push(format!(
            "Discarded fields: {}",
            plan.discarded_fields.join(", ")
        ));
    }
    if !plan.discarded_templates.is_empty() {
        lines.push(format!(
            "Cards removed for templates: {}",
            plan.discarded_templates.join(", ")
        ));
    }
    if let Some(warning) = plan.warning {
        lines.push(format!("Warning: {warning}"));
    }
    lines
}

/// Apply `OUT=IN` overrides to the session, fields first
pub fn apply_overrides(
    remapper: &mut NoteTypeRemapper,
    map_fields: &[String],
    map_templates: &[String],
) -> Result<(), CliError> {
    for raw in map_fields {
        let (output, input) = parse_mapping_arg(raw)?;
        let output_index = resolve_slot(&remapper.output_note_type().fields, &output)
            .ok_or_else(|| {
                CliError::InvalidMapping(raw.clone(), format!("no output field '{output}'"))
            })?;
        let selection = resolve_selection(&remapper.input_note_type().fields, &input)
            .ok_or_else(|| {
                CliError::InvalidMapping(raw.clone(), format!("no input field '{input}'"))
            })?;
        remapper.update_field_mapping(output_index, selection)?;
    }

    if let Some(raw) = map_templates.first() {
        if !remapper.can_change_templates() {
            return Err(CliError::InvalidMapping(
                raw.clone(),
                format!(
                    "templates cannot be mapped for a {} conversion",
                    remapper.conversion_type()
                ),
            ));
        }
    }

    for raw in map_templates {
        let (output, input) = parse_mapping_arg(raw)?;
        let output_index = resolve_slot(&remapper.output_note_type().templates, &output)
            .ok_or_else(|| {
                CliError::InvalidMapping(raw.clone(), format!("no output template '{output}'"))
            })?;
        let selection = resolve_selection(&remapper.input_note_type().templates, &input)
            .ok_or_else(|| {
                CliError::InvalidMapping(raw.clone(), format!("no input template '{input}'"))
            })?;
        remapper.update_template_mapping(output_index, selection)?;
    }

    Ok(())
}

pub fn run_change_notetype(
    args: &ChangeArgs,
    auto_confirm: bool,
    db_path: &Path,
) -> Result<(), CliError> {
    let db = open_database(db_path)?;
    let note_ids = args.notes.iter().copied().map(NoteId).collect();
    let mut remapper = NoteTypeRemapper::load(&db.notetypes(), &db.notes(), note_ids)?;

    let target = resolve_notetype(&db, &args.to)?;
    remapper.set_output_note_type_id(target.id)?;
    apply_overrides(&mut remapper, &args.map_fields, &args.map_templates)?;

    let plan = ConversionPlan::from_session(&remapper);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        for line in format_plan_lines(&plan) {
            println!("{line}");
        }
    }

    if args.dry_run {
        remapper.cancel()?;
        return Ok(());
    }

    let request = match remapper.build_change_request() {
        Err(ntmap_core::Error::NoChanges) => {
            eprintln!("No changes to save");
            return Ok(());
        }
        other => other?,
    };

    let accept = args.yes || auto_confirm;
    let changed = submit_change_request(&db.conversion_backend(), &request, || {
        if accept {
            Ok(true)
        } else {
            prompt_schema_change()
        }
    })?;

    eprintln!("Changed note type of {changed} note(s)");
    Ok(())
}
