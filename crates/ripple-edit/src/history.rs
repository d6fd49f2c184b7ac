//! Bounded, persisted log of committed edits

use std::path::{Path, PathBuf};

use ripple_core::StoreError;
use ripple_core::atomic::{read_json_lenient, write_json_atomic};
use ripple_core::paths::history_path;

use crate::context::EditContext;

pub struct EditHistory {
    path: PathBuf,
    limit: usize,
    entries: Vec<EditContext>,
}

impl EditHistory {
    /// Load `.ripple/edit_history.json`. Missing or corrupt history starts
    /// empty.
    pub fn load(root: &Path, limit: usize) -> Self {
        let path = history_path(root);
        let mut entries: Vec<EditContext> = read_json_lenient(&path).unwrap_or_default();
        let limit = limit.max(1);
        if entries.len() > limit {
            entries.drain(..entries.len() - limit);
        }
        Self {
            path,
            limit,
            entries,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Oldest first.
    pub fn entries(&self) -> &[EditContext] {
        &self.entries
    }

    /// Append and drop the oldest entries beyond the limit.
    pub fn push(&mut self, edit: EditContext) {
        self.entries.push(edit);
        if self.entries.len() > self.limit {
            let excess = self.entries.len() - self.limit;
            self.entries.drain(..excess);
        }
    }

    pub fn find(&self, edit_id: &str) -> Option<&EditContext> {
        self.entries
            .iter()
            .find(|e| e.edit_id.as_deref() == Some(edit_id))
    }

    pub fn find_mut(&mut self, edit_id: &str) -> Option<&mut EditContext> {
        self.entries
            .iter_mut()
            .find(|e| e.edit_id.as_deref() == Some(edit_id))
    }

    pub fn contains(&self, edit_id: &str) -> bool {
        self.find(edit_id).is_some()
    }

    /// Edits of one file. The iterator does not borrow `key`.
    pub fn for_file<'a>(&'a self, key: &str) -> impl Iterator<Item = &'a EditContext> + use<'a> {
        let key = key.to_string();
        self.entries.iter().filter(move |e| e.file_path == key)
    }

    pub fn save(&self) -> Result<(), StoreError> {
        write_json_atomic(&self.path, &self.entries)
    }
}
