//! Immutable author directory snapshot.

use std::collections::HashMap;

use crate::types::UserMapping;

/// Author-id to display-name snapshot used by the transform stage.
///
/// Loaded once from storage before the pipeline starts and never refreshed
/// mid-run; accounts added after startup are unknown until the next restart.
#[derive(Debug, Clone, Default)]
pub struct UserDirectory {
    names: HashMap<i64, String>,
}

impl UserDirectory {
    /// Builds a directory from stored user mappings.
    pub fn from_mappings(mappings: Vec<UserMapping>) -> Self {
        let names = mappings
            .into_iter()
            .map(|mapping| (mapping.author_id, mapping.author_name))
            .collect();

        Self { names }
    }

    /// Looks up the display name for an author id.
    pub fn name_for(&self, author_id: i64) -> Option<&str> {
        self.names.get(&author_id).map(String::as_str)
    }

    /// Number of known authors.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` if the snapshot holds no authors.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
