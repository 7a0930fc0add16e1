pub mod add_note;
pub mod add_notetype;
pub mod change;
pub mod common;
pub mod completions;
pub mod config;
pub mod notes;
pub mod notetypes;
