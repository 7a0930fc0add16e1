//! Collection storage for ntmap

mod change;
mod connection;
mod migrations;
mod repository;
mod schema;

pub use change::{NoteConversionBackend, SqliteConversionBackend};
pub use connection::Database;
pub use repository::{
    NoteRepository, NoteTypeRepository, SqliteNoteRepository, SqliteNoteTypeRepository,
};
