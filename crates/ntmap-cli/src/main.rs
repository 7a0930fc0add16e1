//! ntmap CLI - Change the note type of flashcard notes
//!
//! Converts notes between note types with a reviewable field and template mapping.

mod cli;
mod commands;
mod config;
mod error;

use clap::Parser;
use tracing_subscriber::filter::{Directive, LevelFilter};

use crate::cli::{Cli, Commands};
use crate::commands::add_note::run_add_note;
use crate::commands::add_notetype::run_add_notetype;
use crate::commands::change::run_change_notetype;
use crate::commands::completions::run_completions;
use crate::commands::config::run_config;
use crate::commands::notes::run_notes;
use crate::commands::notetypes::run_notetypes;
use crate::config::CliConfig;
use crate::error::CliError;

fn main() {
    if let Err(error) = run() {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

fn log_directive(verbose: bool) -> Directive {
    let level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    format!("ntmap={level}")
        .parse()
        .unwrap_or_else(|_| level.into())
}

fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(log_directive(cli.verbose)),
        )
        .init();

    if let Commands::Completions { shell, output } = &cli.command {
        return run_completions(*shell, output.as_deref());
    }

    if let Commands::Config {
        set_collection,
        auto_confirm,
    } = &cli.command
    {
        return run_config(set_collection.clone(), *auto_confirm);
    }

    let config = CliConfig::load().map_err(CliError::Config)?;
    let db_path = config
        .resolve_collection_path(cli.collection)
        .map_err(CliError::Config)?;

    match cli.command {
        Commands::Notetypes { json } => run_notetypes(json, &db_path)?,
        Commands::Notes { notetype, json } => run_notes(notetype.as_deref(), json, &db_path)?,
        Commands::AddNotetype {
            name,
            fields,
            templates,
            cloze,
        } => run_add_notetype(&name, &fields, &templates, cloze, &db_path)?,
        Commands::AddNote { notetype, fields } => run_add_note(&notetype, &fields, &db_path)?,
        Commands::ChangeNotetype(args) => {
            run_change_notetype(&args, config.auto_confirm_schema_change, &db_path)?;
        }
        Commands::Config { .. } | Commands::Completions { .. } => {}
    }

    Ok(())
}
