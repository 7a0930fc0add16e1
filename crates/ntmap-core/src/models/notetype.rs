//! Note type model

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use super::note::extract_cloze_ordinals;

/// Name of the single implicit template of a cloze note type
pub const CLOZE_TEMPLATE_NAME: &str = "Cloze";

/// Identifier of a note type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteTypeId(pub i64);

impl fmt::Display for NoteTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NoteTypeId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

/// The schema of a note: ordered fields and ordered card templates.
///
/// A cloze note type has exactly one implicit template which generates one
/// card per cloze number found in the note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteType {
    pub id: NoteTypeId,
    pub name: String,
    pub fields: Vec<String>,
    pub templates: Vec<String>,
    pub is_cloze: bool,
}

impl NoteType {
    /// Create a regular (non-cloze) note type
    pub fn regular(
        id: NoteTypeId,
        name: impl Into<String>,
        fields: &[&str],
        templates: &[&str],
    ) -> Self {
        Self {
            id,
            name: name.into(),
            fields: fields.iter().map(ToString::to_string).collect(),
            templates: templates.iter().map(ToString::to_string).collect(),
            is_cloze: false,
        }
    }

    /// Create a cloze note type with its single implicit template
    pub fn cloze(id: NoteTypeId, name: impl Into<String>, fields: &[&str]) -> Self {
        Self {
            id,
            name: name.into(),
            fields: fields.iter().map(ToString::to_string).collect(),
            templates: vec![CLOZE_TEMPLATE_NAME.to_string()],
            is_cloze: true,
        }
    }

    /// Index of the field with exactly this name
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field == name)
    }

    /// Index of the template with exactly this name
    pub fn template_index(&self, name: &str) -> Option<usize> {
        self.templates.iter().position(|template| template == name)
    }

    /// Short label for listings
    pub const fn kind(&self) -> &'static str {
        if self.is_cloze {
            "cloze"
        } else {
            "regular"
        }
    }

    /// Card ordinals a note with these field values generates.
    ///
    /// Regular note types generate one card per template. Cloze note types
    /// generate one card per distinct cloze number, and always at least one.
    pub fn card_ordinals(&self, fields: &[String]) -> BTreeSet<usize> {
        if !self.is_cloze {
            return (0..self.templates.len()).collect();
        }

        let mut ordinals: BTreeSet<usize> = fields
            .iter()
            .flat_map(|field| extract_cloze_ordinals(field))
            .collect();
        if ordinals.is_empty() {
            ordinals.insert(0);
        }
        ordinals
    }
}

/// How the regular/cloze status changes between two note types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionType {
    RegularToRegular,
    RegularToCloze,
    ClozeToRegular,
    ClozeToCloze,
}

impl ConversionType {
    pub const fn from_note_type_change(current: &NoteType, new: &NoteType) -> Self {
        match (current.is_cloze, new.is_cloze) {
            (true, true) => Self::ClozeToCloze,
            (true, false) => Self::ClozeToRegular,
            (false, true) => Self::RegularToCloze,
            (false, false) => Self::RegularToRegular,
        }
    }

    /// Templates can only be remapped between two regular note types
    pub const fn allows_template_mapping(self) -> bool {
        matches!(self, Self::RegularToRegular)
    }

    /// Warning to surface before the change is committed
    pub const fn warning(self) -> Option<&'static str> {
        match self {
            Self::RegularToRegular => None,
            Self::RegularToCloze => Some(
                "Converting to a cloze note type: cards whose cloze number does not appear in \
                 the note are removed, remaining cards keep their scheduling",
            ),
            Self::ClozeToRegular => Some(
                "Converting from a cloze note type: cloze cards without a matching template \
                 are removed",
            ),
            Self::ClozeToCloze => {
                Some("Cards whose cloze number no longer appears in the note are removed")
            }
        }
    }
}

impl fmt::Display for ConversionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::RegularToRegular => "regular -> regular",
            Self::RegularToCloze => "regular -> cloze",
            Self::ClozeToRegular => "cloze -> regular",
            Self::ClozeToCloze => "cloze -> cloze",
        };
        f.write_str(label)
    }
}
