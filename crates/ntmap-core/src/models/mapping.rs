//! Field and template mappings between two note types

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A user selection for one output field or template: a source index in the
/// input note type, or nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<usize>", into = "Option<usize>")]
pub enum SelectedIndex {
    /// Inherit from the input field/template at this index
    Source(usize),
    /// Leave empty (fields) or inherit nothing (templates)
    Discard,
}

impl SelectedIndex {
    pub const fn source(self) -> Option<usize> {
        match self {
            Self::Source(index) => Some(index),
            Self::Discard => None,
        }
    }

    pub const fn is_discard(self) -> bool {
        matches!(self, Self::Discard)
    }
}

impl From<Option<usize>> for SelectedIndex {
    fn from(value: Option<usize>) -> Self {
        value.map_or(Self::Discard, Self::Source)
    }
}

impl From<SelectedIndex> for Option<usize> {
    fn from(value: SelectedIndex) -> Self {
        value.source()
    }
}

impl fmt::Display for SelectedIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source(index) => write!(f, "{index}"),
            Self::Discard => f.write_str("(nothing)"),
        }
    }
}

/// Mapping from output index to [`SelectedIndex`].
///
/// Dense by construction: entry `i` belongs to output field/template `i`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndexMapping(Vec<SelectedIndex>);

/// Output field index -> input field. Several outputs may share a source.
pub type FieldMapping = IndexMapping;

/// Output template index -> input template. A source is used at most once.
pub type TemplateMapping = IndexMapping;

impl IndexMapping {
    /// Wrap explicit entries, one per output index
    pub const fn new(entries: Vec<SelectedIndex>) -> Self {
        Self(entries)
    }

    /// `i -> i` for every index below `len`
    pub fn identity(len: usize) -> Self {
        Self((0..len).map(SelectedIndex::Source).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, output_index: usize) -> Option<SelectedIndex> {
        self.0.get(output_index).copied()
    }

    pub fn entries(&self) -> &[SelectedIndex] {
        &self.0
    }

    /// `(output_index, selection)` pairs in output order
    pub fn iter(&self) -> impl Iterator<Item = (usize, SelectedIndex)> + '_ {
        self.0.iter().copied().enumerate()
    }

    /// All input indices referenced by this mapping
    pub fn used_sources(&self) -> BTreeSet<usize> {
        self.0.iter().filter_map(|entry| entry.source()).collect()
    }

    /// Output index currently inheriting from `source`, if any
    pub fn output_for_source(&self, source: usize) -> Option<usize> {
        self.0
            .iter()
            .position(|entry| *entry == SelectedIndex::Source(source))
    }

    /// Names of inputs not referenced by any entry
    pub fn discarded_names(&self, input_names: &[String]) -> Vec<String> {
        let used = self.used_sources();
        input_names
            .iter()
            .enumerate()
            .filter(|(index, _)| !used.contains(index))
            .map(|(_, name)| name.clone())
            .collect()
    }

    /// Overwrite one entry. The caller validates the index.
    pub(crate) fn set(&mut self, output_index: usize, selection: SelectedIndex) {
        self.0[output_index] = selection;
    }

    /// Legacy integer form: input index per output, `-1` for nothing
    #[allow(clippy::cast_possible_wrap)]
    pub fn to_ordinals(&self) -> Vec<i64> {
        self.0
            .iter()
            .map(|entry| entry.source().map_or(-1, |index| index as i64))
            .collect()
    }
}

impl fmt::Display for IndexMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (index, entry) in self.iter() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{index}: {entry}")?;
        }
        f.write_str("}")
    }
}
