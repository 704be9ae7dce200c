use core::{convert::Infallible, num::NonZeroU32};
use std::collections::HashMap;

use crate::{
    error::Error,
    generator::{Mutex, acquire},
    store::{DataStore, OptimisticStore, Reservation, SEED_VALUE, Versioned},
};

use super::optimistic::reserve_with_optimistic_write;

#[derive(Debug)]
struct Record {
    data: String,
    version: u64,
}

/// An in-process store of versioned counter records.
///
/// Every successful write bumps the record version, and a write presenting a
/// stale version is rejected, which is the same contract a conditional-write
/// object store or database row offers. Share one instance between several
/// generators through `&MemoryStore` or `Arc<MemoryStore>`.
///
/// Nothing is persisted beyond the lifetime of the value.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, Record>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the raw counter currently stored for `scope`, if any.
    pub fn persisted(&self, scope: &str) -> Option<String> {
        self.with_records(|records| records.get(scope).map(|r| r.data.clone()))
    }

    /// Returns the current version of the record for `scope`, if any.
    pub fn version(&self, scope: &str) -> Option<u64> {
        self.with_records(|records| records.get(scope).map(|r| r.version))
    }

    /// Overwrites the record for `scope` unconditionally, bumping its version.
    ///
    /// Intended for migrations and for simulating foreign writers.
    pub fn put_raw(&self, scope: &str, data: impl Into<String>) {
        let data = data.into();
        self.with_records(|records| match records.get_mut(scope) {
            Some(record) => {
                record.data = data;
                record.version += 1;
            }
            None => {
                records.insert(scope.to_owned(), Record { data, version: 0 });
            }
        });
    }

    // Inspection helpers stay usable after a panic in another thread.
    fn with_records<R>(&self, f: impl FnOnce(&mut HashMap<String, Record>) -> R) -> R {
        #[cfg(feature = "parking-lot")]
        let mut records = self.records.lock();
        #[cfg(not(feature = "parking-lot"))]
        let mut records = self
            .records
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        f(&mut records)
    }
}

impl OptimisticStore for MemoryStore {
    type Version = u64;
    type Err = Infallible;

    fn get_data(&self, scope: &str) -> Result<Versioned<u64>, Error<Infallible>> {
        let mut records = acquire!(self.records.lock());
        let record = records.entry(scope.to_owned()).or_insert_with(|| Record {
            data: SEED_VALUE.to_string(),
            version: 0,
        });
        Ok(Versioned {
            data: record.data.clone(),
            version: record.version,
        })
    }

    fn try_optimistic_write(
        &self,
        scope: &str,
        data: &str,
        version: &u64,
    ) -> Result<bool, Error<Infallible>> {
        let mut records = acquire!(self.records.lock());
        match records.get_mut(scope) {
            Some(record) if record.version == *version => {
                data.clone_into(&mut record.data);
                record.version += 1;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

impl DataStore for MemoryStore {
    type Err = Infallible;

    fn reserve_batch(
        &self,
        scope: &str,
        batch_size: NonZeroU32,
    ) -> Result<Reservation, Error<Infallible>> {
        reserve_with_optimistic_write(self, scope, batch_size)
    }
}
