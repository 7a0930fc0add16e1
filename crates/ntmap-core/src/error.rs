//! Error types for ntmap-core

use thiserror::Error;

use crate::remap::SessionState;

/// Result type alias using ntmap-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in ntmap-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// `SQLite` error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Note, card or note type not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The pending note type change would not modify anything
    #[error("No changes to save")]
    NoChanges,

    /// The change modifies the collection schema and forces a one-way sync.
    ///
    /// The caller must confirm with the user, mark the schema as modified and retry.
    #[error("This change requires a one-way sync; confirmation is required")]
    SchemaChangeRequiresConfirmation,

    /// The remapping session was already submitted or cancelled
    #[error("Remapping session is {0} and can no longer be modified")]
    SessionClosed(SessionState),
}
