//! ntmap-core - Core library for ntmap
//!
//! This crate contains the note type remapping model, the collection store
//! and the conversion backend used by the ntmap CLI.

pub mod db;
pub mod error;
pub mod models;
pub mod remap;
pub mod util;

pub use error::{Error, Result};
pub use models::{FieldMapping, NoteType, NoteTypeId, SelectedIndex, TemplateMapping};
pub use remap::{ChangeRequest, NoteTypeRemapper};
