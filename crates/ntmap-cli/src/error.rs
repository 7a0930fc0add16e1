use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] ntmap_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Note type not found: {0}")]
    NoteTypeNotFound(String),
    #[error("Invalid mapping '{0}': {1}")]
    InvalidMapping(String, String),
    #[error("Note type '{0}' has {1} fields, got {2} values")]
    TooManyFields(String, usize, usize),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("This change requires a one-way sync. Re-run with --yes to accept it.")]
    ConfirmationRequired,
    #[error("Note type change cancelled")]
    ConfirmationDeclined,
}
