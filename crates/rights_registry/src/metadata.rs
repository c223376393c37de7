//! Metadata store: right id → bounded descriptive string

use crate::types::{RightId, MAX_METADATA_LEN, MIN_METADATA_LEN};
use std::collections::BTreeMap;

/// Length of `data` in characters.
pub fn metadata_len(data: &str) -> usize {
    data.chars().count()
}

/// `true` iff `data` is 1..=256 characters long.
pub fn validate_length(data: &str) -> bool {
    (MIN_METADATA_LEN..=MAX_METADATA_LEN).contains(&metadata_len(data))
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataStore {
    entries: BTreeMap<RightId, String>,
}

impl MetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: RightId) -> Option<&str> {
        self.entries.get(&id).map(String::as_str)
    }

    /// Upsert. Callers validate the length first.
    pub fn set(&mut self, id: RightId, data: String) {
        debug_assert!(validate_length(&data));
        self.entries.insert(id, data);
    }

    pub fn remove(&mut self, id: RightId) -> Option<String> {
        self.entries.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (RightId, &str)> {
        self.entries.iter().map(|(id, data)| (*id, data.as_str()))
    }
}

impl FromIterator<(RightId, String)> for MetadataStore {
    fn from_iter<T: IntoIterator<Item = (RightId, String)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
