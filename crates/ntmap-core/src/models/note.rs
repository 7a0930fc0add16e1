//! Note and card models

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use super::NoteTypeId;

static CLOZE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{c(\d+)::").expect("Invalid regex"));

/// Identifier of a note
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(pub i64);

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NoteId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

/// Identifier of a card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(pub i64);

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A note: one value per field of its note type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Unique identifier
    pub id: NoteId,
    /// Note type the field values belong to
    pub notetype_id: NoteTypeId,
    /// Field values, in note type field order
    pub fields: Vec<String>,
    /// Last modification timestamp (Unix ms)
    pub modified: i64,
}

impl Note {
    /// Get the first field, truncated to `max_len` characters
    #[must_use]
    pub fn preview(&self, max_len: usize) -> String {
        self.fields
            .first()
            .map(String::as_str)
            .unwrap_or("")
            .lines()
            .next()
            .unwrap_or("")
            .chars()
            .take(max_len)
            .collect()
    }
}

/// A card generated from a note, with the scheduling data it carries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub note_id: NoteId,
    /// Template index for regular note types, cloze number minus one for cloze
    pub ord: usize,
    /// Due position or day number
    pub due: i64,
    /// Current interval in days
    pub interval: i64,
    /// Number of reviews
    pub reps: i64,
}

/// Extract zero-based card ordinals from cloze deletions.
///
/// `{{c1::...}}` maps to ordinal 0. `c0` is ignored.
///
/// # Examples
///
/// ```
/// use ntmap_core::models::extract_cloze_ordinals;
///
/// let ords = extract_cloze_ordinals("{{c2::Paris}} is the capital of {{c1::France}}");
/// assert_eq!(ords.into_iter().collect::<Vec<_>>(), vec![0, 1]);
/// ```
#[must_use]
pub fn extract_cloze_ordinals(text: &str) -> BTreeSet<usize> {
    CLOZE_RE
        .captures_iter(text)
        .filter_map(|cap| cap[1].parse::<usize>().ok())
        .filter(|number| *number > 0)
        .map(|number| number - 1)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_id_parse() {
        let parsed: NoteId = "1700000000000".parse().unwrap();
        assert_eq!(parsed, NoteId(1_700_000_000_000));
        assert!("not-a-number".parse::<NoteId>().is_err());
    }

    #[test]
    fn test_extract_cloze_ordinals_basic() {
        let ords = extract_cloze_ordinals("{{c1::test}} {{c2::more}}");
        assert_eq!(ords.into_iter().collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn test_extract_cloze_ordinals_deduplicates() {
        let ords = extract_cloze_ordinals("{{c1::a}} {{c1::b}} {{c1::c}}");
        assert_eq!(ords.len(), 1);
    }

    #[test]
    fn test_extract_cloze_ordinals_ignores_invalid() {
        assert!(extract_cloze_ordinals("{{c0::zero}} {{cx::bad}} c1::").is_empty());
        assert!(extract_cloze_ordinals("").is_empty());
    }

    #[test]
    fn test_preview() {
        let note = Note {
            id: NoteId(1),
            notetype_id: NoteTypeId(1),
            fields: vec!["First line\nSecond".to_string(), "Back".to_string()],
            modified: 0,
        };
        assert_eq!(note.preview(50), "First line");
        assert_eq!(note.preview(5), "First");
    }

    #[test]
    fn test_preview_without_fields() {
        let note = Note {
            id: NoteId(1),
            notetype_id: NoteTypeId(1),
            fields: Vec::new(),
            modified: 0,
        };
        assert_eq!(note.preview(10), "");
    }
}
