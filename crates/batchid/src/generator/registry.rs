use std::{collections::HashMap, sync::Arc};

use crate::{
    error::Error,
    generator::{RwLock, acquire},
};

/// A concurrent arena of per-scope values keyed by scope name.
///
/// Entries are created lazily and never removed. Lookups of existing entries
/// only take the shared read lock; the write lock is held just long enough to
/// re-check and insert a missing entry.
pub(crate) struct ScopeRegistry<V> {
    entries: RwLock<HashMap<String, Arc<V>>>,
}

impl<V> ScopeRegistry<V> {
    pub(crate) fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the entry for `scope`, creating it with `init` on first use.
    ///
    /// `init` runs at most once per scope, under the write lock.
    pub(crate) fn get_or_insert_with<E>(
        &self,
        scope: &str,
        init: impl FnOnce() -> V,
    ) -> Result<Arc<V>, Error<E>> {
        if let Some(entry) = self.get(scope)? {
            return Ok(entry);
        }

        let mut entries = acquire!(self.entries.write());
        // another thread may have inserted between the two locks
        if let Some(entry) = entries.get(scope) {
            return Ok(Arc::clone(entry));
        }
        let entry = Arc::new(init());
        entries.insert(scope.to_owned(), Arc::clone(&entry));
        Ok(entry)
    }

    /// Returns the entry for `scope` if it already exists.
    pub(crate) fn get<E>(&self, scope: &str) -> Result<Option<Arc<V>>, Error<E>> {
        let entries = acquire!(self.entries.read());
        Ok(entries.get(scope).map(Arc::clone))
    }

    /// Number of scopes touched so far.
    pub(crate) fn len<E>(&self) -> Result<usize, Error<E>> {
        let entries = acquire!(self.entries.read());
        Ok(entries.len())
    }
}
