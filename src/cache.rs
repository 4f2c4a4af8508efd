//! Path-keyed cache of loaded tables.
//!
//! Entries never expire on their own; callers invalidate them when the file
//! behind a path changes.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::error::LoadError;
use crate::loader::{LoadOptions, load_table};
use crate::records::RecordTable;

#[derive(Debug, Default)]
pub struct TableCache {
    entries: HashMap<PathBuf, Arc<RecordTable>>,
}

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached table for `path`, loading it on first use.
    ///
    /// Options only matter for that first load; a cached entry is returned as
    /// is until it is invalidated.
    pub fn get_or_load(
        &mut self,
        path: &Path,
        options: LoadOptions,
    ) -> Result<Arc<RecordTable>, LoadError> {
        if let Some(table) = self.entries.get(path) {
            debug!(path = %path.display(), "Table cache hit");
            return Ok(Arc::clone(table));
        }

        debug!(path = %path.display(), "Table cache miss");
        let table = Arc::new(load_table(path, options)?);
        self.entries.insert(path.to_path_buf(), Arc::clone(&table));
        Ok(table)
    }

    /// Drops the entry for `path`. Returns whether one was cached.
    pub fn invalidate(&mut self, path: &Path) -> bool {
        self.entries.remove(path).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
