#[cfg(feature = "tracing")]
use tracing::{debug, instrument, trace, warn};

use crate::{
    config::GeneratorConfig,
    error::Error,
    generator::{
        ScopeCursor, ScopedIdGenerator,
        cursor::{CursorCell, lock_cursor, new_cursor_cell},
        registry::ScopeRegistry,
    },
    store::{DataStore, Reservation},
};

/// A thread-safe generator issuing unique ids per scope from batches reserved
/// in a shared [`DataStore`].
///
/// Every scope gets its own [`ScopeCursor`] behind its own lock, created the
/// first time the scope is used. Calls for the same scope are serialized by
/// that lock; calls for different scopes never wait on each other.
///
/// When a cursor runs out of reserved ids, the generator asks the store for
/// the next [`GeneratorConfig::batch_size`] ids. A lost race is retried up to
/// [`GeneratorConfig::max_write_attempts`] times; any other store failure is
/// returned immediately.
///
/// ## Features
/// - ✅ Thread-safe
/// - ✅ Unique across processes sharing one store
/// - ❌ Ids are not consumed in global order across generators
///
/// ## Recommended When
/// - Several processes need short, dense, numeric ids
/// - The only shared infrastructure is a store with conditional writes
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use batchid::{BatchIdGenerator, GeneratorConfig, MemoryStore};
///
/// let store = Arc::new(MemoryStore::new());
/// let config = GeneratorConfig::new().with_batch_size(3)?;
/// let first = BatchIdGenerator::with_config(Arc::clone(&store), config);
/// let second = BatchIdGenerator::with_config(Arc::clone(&store), config);
///
/// assert_eq!(first.next_id("users")?, 1);
/// assert_eq!(second.next_id("users")?, 4);
/// assert_eq!(first.next_id("users")?, 2);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct BatchIdGenerator<S> {
    store: S,
    config: GeneratorConfig,
    scopes: ScopeRegistry<CursorCell>,
}

impl<S: DataStore> BatchIdGenerator<S> {
    /// Creates a generator with the default [`GeneratorConfig`].
    ///
    /// The store is not accessed until the first call to
    /// [`Self::next_id`].
    pub fn new(store: S) -> Self {
        Self::with_config(store, GeneratorConfig::default())
    }

    /// Creates a generator with an explicit configuration.
    pub fn with_config(store: S, config: GeneratorConfig) -> Self {
        Self {
            store,
            config,
            scopes: ScopeRegistry::new(),
        }
    }

    /// Returns the configuration this generator was built with.
    pub const fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Returns the underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Returns the next id for `scope`.
    ///
    /// Only touches the store when the locally reserved batch is used up.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyScope`] if `scope` is empty.
    /// - [`Error::Contention`] if every reservation attempt lost the race.
    /// - [`Error::DataCorruption`] if the stored counter is invalid.
    /// - [`Error::Overflow`] if the counter is exhausted.
    /// - [`Error::Store`] if the store itself failed.
    /// - [`Error::LockPoisoned`] if another thread panicked while holding the
    ///   scope registry lock (never with the `parking-lot` feature).
    ///
    /// On error the scope's cursor is left untouched, so the next call starts
    /// over cleanly. This includes a store that panics during a refill.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn next_id(&self, scope: &str) -> Result<i64, Error<S::Err>> {
        if scope.is_empty() {
            return Err(Error::EmptyScope);
        }

        let cell = self.scopes.get_or_insert_with(scope, new_cursor_cell)?;
        let mut cursor = lock_cursor(&cell);

        if cursor.is_exhausted() {
            self.refill(scope, &mut cursor)?;
        }
        Ok(cursor.advance())
    }

    /// Returns a copy of the cursor for `scope`, or `None` if the scope has
    /// not been used by this generator.
    ///
    /// # Errors
    ///
    /// [`Error::LockPoisoned`] if the registry lock was poisoned.
    pub fn cursor(&self, scope: &str) -> Result<Option<ScopeCursor>, Error<S::Err>> {
        match self.scopes.get(scope)? {
            Some(cell) => {
                let cursor = *lock_cursor(&cell);
                Ok(Some(cursor))
            }
            None => Ok(None),
        }
    }

    /// Number of distinct scopes this generator holds a cursor for.
    ///
    /// Cursors are never evicted.
    ///
    /// # Errors
    ///
    /// [`Error::LockPoisoned`] if the registry lock was poisoned.
    pub fn scope_count(&self) -> Result<usize, Error<S::Err>> {
        self.scopes.len()
    }

    /// Reserves a new batch for `scope` and points `cursor` at it.
    ///
    /// Runs with the cursor lock held. The cursor is only written once a
    /// reservation succeeds and the whole batch fits in an `i64`.
    fn refill(&self, scope: &str, cursor: &mut ScopeCursor) -> Result<(), Error<S::Err>> {
        let batch_size = self.config.batch_size();
        let max_attempts = self.config.max_write_attempts().get();

        let mut attempts = 0;
        while attempts < max_attempts {
            match self.store.reserve_batch(scope, batch_size)? {
                Reservation::Reserved { start } if start <= 0 => {
                    #[cfg(feature = "tracing")]
                    warn!(scope, start, "store reserved a non-positive start");
                    return Err(Error::DataCorruption {
                        scope: scope.to_owned(),
                        raw: start.to_string(),
                    });
                }
                Reservation::Reserved { start } => {
                    #[cfg(feature = "tracing")]
                    debug!(scope, start, batch_size = batch_size.get(), attempts, "reserved batch");
                    return cursor.reset_to_batch(start, batch_size).ok_or_else(|| {
                        Error::Overflow {
                            scope: scope.to_owned(),
                            batch_size: batch_size.get(),
                        }
                    });
                }
                Reservation::Conflict => {
                    attempts += 1;
                    #[cfg(feature = "tracing")]
                    trace!(scope, attempts, "lost reservation race");
                }
            }
        }

        #[cfg(feature = "tracing")]
        warn!(scope, attempts, "gave up reserving a batch");
        Err(Error::Contention { attempts })
    }
}

impl<S: DataStore> ScopedIdGenerator for BatchIdGenerator<S> {
    type Err = Error<S::Err>;

    fn next_id(&self, scope: &str) -> Result<i64, Self::Err> {
        self.next_id(scope)
    }
}
