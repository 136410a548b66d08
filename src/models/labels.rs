//! Label normalization shared by indexing and querying.
//!
//! The search match is an exact keyword match, so every label and every slot
//! value must pass through [`normalize_label`] before it is stored or searched.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, btree_set};

/// Trim surrounding whitespace and lowercase a raw label.
pub fn normalize_label(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Parse a comma-separated custom label string.
///
/// Segments are normalized and empty segments dropped, so `""` yields an empty
/// list rather than a single blank label.
pub fn parse_custom_labels(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(normalize_label)
        .filter(|label| !label.is_empty())
        .collect()
}

/// Set of normalized labels attached to a photo.
///
/// Every insert is normalized, so duplicates collapse case-insensitively and
/// the serialized form is a sorted JSON array.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct LabelSet(BTreeSet<String>);

impl LabelSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a raw label. Returns `false` for blanks and duplicates.
    pub fn insert(&mut self, raw: &str) -> bool {
        let label = normalize_label(raw);
        if label.is_empty() {
            return false;
        }
        self.0.insert(label)
    }

    pub fn contains(&self, raw: &str) -> bool {
        self.0.contains(&normalize_label(raw))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> btree_set::Iter<'_, String> {
        self.0.iter()
    }
}

impl<S: AsRef<str>> FromIterator<S> for LabelSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = LabelSet::new();
        set.extend(iter);
        set
    }
}

impl<S: AsRef<str>> Extend<S> for LabelSet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for raw in iter {
            self.insert(raw.as_ref());
        }
    }
}

impl<'a> IntoIterator for &'a LabelSet {
    type Item = &'a String;
    type IntoIter = btree_set::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
