//! Memoized dataset loads.
//!
//! The visit file is read once per path and shared as an immutable
//! `Arc<VisitTable>`. Later loads of the same path return the same handle
//! without touching the file again. Entries only go away through
//! `invalidate` or `clear`.

use crate::{error::DashResult, loader, table::VisitTable};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

#[derive(Default)]
pub struct DatasetCache {
    entries: Mutex<HashMap<PathBuf, Arc<VisitTable>>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide cache.
    pub fn global() -> &'static DatasetCache {
        static GLOBAL: OnceLock<DatasetCache> = OnceLock::new();
        GLOBAL.get_or_init(DatasetCache::new)
    }

    /// Return the cached table for `path`, loading it on first access.
    ///
    /// The lock is held across the load so two callers racing on the same
    /// path still read the file once.
    pub fn load(&self, path: impl AsRef<Path>) -> DashResult<Arc<VisitTable>> {
        let key = cache_key(path.as_ref());
        let mut entries = self.lock();

        if let Some(table) = entries.get(&key) {
            log::debug!("cache hit for {}", key.display());
            return Ok(Arc::clone(table));
        }

        let table = Arc::new(loader::load_path(&key)?);
        log::info!("cached {} rows for {}", table.len(), key.display());
        entries.insert(key, Arc::clone(&table));
        Ok(table)
    }

    /// Drop the entry for `path`. Returns whether one existed.
    pub fn invalidate(&self, path: impl AsRef<Path>) -> bool {
        let key = cache_key(path.as_ref());
        self.lock().remove(&key).is_some()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PathBuf, Arc<VisitTable>>> {
        // Entries are only ever inserted whole, so a poisoned map is still valid.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn cache_key(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
