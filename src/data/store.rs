// src/data/store.rs
//! Process-wide memoized data loading.
//!
//! Each source path is loaded at most once. The cache is a concurrent map
//! of populate-once cells: concurrent first calls for one path block on
//! the same cell and only one of them reads the disk. Failed loads leave
//! the cell empty, so the next call retries. There is no invalidation;
//! callers that need fresh data use a different path or a new process.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::{Lazy, OnceCell};
use tracing::debug;

use super::{load_collection, DataResult, DatasetCollection};

static GLOBAL: Lazy<Arc<DataStore>> = Lazy::new(|| Arc::new(DataStore::new()));

type Slot = Arc<OnceCell<Arc<DatasetCollection>>>;

/// Memoizing loader for [`DatasetCollection`]s keyed by source path.
#[derive(Debug, Default)]
pub struct DataStore {
    entries: DashMap<PathBuf, Slot>,
}

impl DataStore {
    /// Create an empty store, independent of the global one.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide store.
    pub fn global() -> Arc<DataStore> {
        Arc::clone(&GLOBAL)
    }

    /// Load the collection at `source`, reading from disk only on first use.
    ///
    /// The returned collection is shared; callers that filter must produce
    /// copies rather than mutate it.
    pub fn load(&self, source: impl AsRef<Path>) -> DataResult<Arc<DatasetCollection>> {
        let source = source.as_ref();
        // The map guard is released at the end of this statement, so slow
        // loads never hold a shard lock.
        let slot: Slot = Arc::clone(&self.entries.entry(source.to_path_buf()).or_default());

        let mut loaded = false;
        let collection = slot.get_or_try_init(|| {
            loaded = true;
            load_collection(source).map(Arc::new)
        })?;

        if !loaded {
            debug!(source = %source.display(), "data source cache hit");
        }
        Ok(Arc::clone(collection))
    }

    /// Whether `source` has been loaded successfully.
    pub fn is_cached(&self, source: impl AsRef<Path>) -> bool {
        self.entries
            .get(source.as_ref())
            .is_some_and(|slot| slot.value().get().is_some())
    }

    /// Number of successfully loaded sources.
    pub fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.value().get().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
