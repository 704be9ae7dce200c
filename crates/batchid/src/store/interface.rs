use core::{fmt, num::NonZeroU32};
use std::sync::Arc;

use crate::error::Error;

/// The value a counter record is created with the first time a scope is
/// touched. The first id issued for a new scope is therefore `1`.
pub const SEED_VALUE: i64 = 1;

/// Outcome of a single [`DataStore::reserve_batch`] call.
///
/// - [`Reservation::Reserved`] means the caller now owns the ids
///   `start..=start + batch_size - 1`.
/// - [`Reservation::Conflict`] means another writer updated the counter first.
///   Nothing was reserved and the caller should try again with fresh data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Reservation {
    /// A batch was reserved.
    Reserved {
        /// First id of the reserved batch. Always positive.
        start: i64,
    },
    /// The version-checked write lost the race.
    Conflict,
}

impl Reservation {
    /// The raw value used by backends that signal a lost race in-band.
    pub const CONFLICT_SENTINEL: i64 = -1;

    /// Interprets a raw backend result.
    ///
    /// Returns `None` for values that are neither a positive start id nor the
    /// conflict sentinel.
    pub const fn from_raw(raw: i64) -> Option<Self> {
        match raw {
            Self::CONFLICT_SENTINEL => Some(Self::Conflict),
            start if start > 0 => Some(Self::Reserved { start }),
            _ => None,
        }
    }

    /// Converts back to the raw in-band convention.
    pub const fn to_raw(self) -> i64 {
        match self {
            Self::Reserved { start } => start,
            Self::Conflict => Self::CONFLICT_SENTINEL,
        }
    }
}

/// A store able to atomically reserve the next batch of ids for a scope.
///
/// Implementations must guarantee that, across every client sharing the
/// store, at most one reservation succeeds per counter version, and that a
/// losing writer reports [`Reservation::Conflict`] rather than overwriting the
/// winner's update.
pub trait DataStore {
    /// Backend-specific failure type, carried in [`Error::Store`].
    type Err: fmt::Debug;

    /// Reserves `batch_size` ids for `scope`.
    ///
    /// Creates the counter record seeded with [`SEED_VALUE`] if it does not
    /// exist yet, reads its current value `V`, and attempts a version-checked
    /// write of `V + batch_size`.
    ///
    /// # Errors
    ///
    /// - [`Error::DataCorruption`] if the stored value is not a positive
    ///   integer.
    /// - [`Error::Overflow`] if `V + batch_size` does not fit in an `i64`.
    /// - [`Error::Store`] for any backend failure other than a lost race.
    fn reserve_batch(
        &self,
        scope: &str,
        batch_size: NonZeroU32,
    ) -> Result<Reservation, Error<Self::Err>>;
}

impl<S: DataStore + ?Sized> DataStore for &S {
    type Err = S::Err;

    fn reserve_batch(
        &self,
        scope: &str,
        batch_size: NonZeroU32,
    ) -> Result<Reservation, Error<Self::Err>> {
        (**self).reserve_batch(scope, batch_size)
    }
}

impl<S: DataStore + ?Sized> DataStore for Arc<S> {
    type Err = S::Err;

    fn reserve_batch(
        &self,
        scope: &str,
        batch_size: NonZeroU32,
    ) -> Result<Reservation, Error<Self::Err>> {
        (**self).reserve_batch(scope, batch_size)
    }
}

impl<S: DataStore + ?Sized> DataStore for Box<S> {
    type Err = S::Err;

    fn reserve_batch(
        &self,
        scope: &str,
        batch_size: NonZeroU32,
    ) -> Result<Reservation, Error<Self::Err>> {
        (**self).reserve_batch(scope, batch_size)
    }
}

/// Data read from an [`OptimisticStore`] together with the version it was
/// read at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Versioned<V> {
    /// The raw counter value, a decimal string for well-formed records.
    pub data: String,
    /// Opaque version token (an ETag, a generation number, ...).
    pub version: V,
}

/// A store offering a plain read and a version-checked write.
///
/// Wrap one in an [`OptimisticAdapter`] to use it as a [`DataStore`].
///
/// [`OptimisticAdapter`]: crate::OptimisticAdapter
pub trait OptimisticStore {
    /// Version token handed back to [`OptimisticStore::try_optimistic_write`].
    type Version;
    /// Backend-specific failure type, carried in [`Error::Store`].
    type Err: fmt::Debug;

    /// Reads the counter for `scope`, seeding it with [`SEED_VALUE`] if the
    /// record does not exist yet.
    ///
    /// # Errors
    ///
    /// Any backend failure.
    fn get_data(&self, scope: &str) -> Result<Versioned<Self::Version>, Error<Self::Err>>;

    /// Writes `data` only if the record is still at `version`.
    ///
    /// Returns `Ok(false)` if the version no longer matches.
    ///
    /// # Errors
    ///
    /// Any backend failure other than a version mismatch.
    fn try_optimistic_write(
        &self,
        scope: &str,
        data: &str,
        version: &Self::Version,
    ) -> Result<bool, Error<Self::Err>>;
}

impl<S: OptimisticStore + ?Sized> OptimisticStore for Arc<S> {
    type Version = S::Version;
    type Err = S::Err;

    fn get_data(&self, scope: &str) -> Result<Versioned<Self::Version>, Error<Self::Err>> {
        (**self).get_data(scope)
    }

    fn try_optimistic_write(
        &self,
        scope: &str,
        data: &str,
        version: &Self::Version,
    ) -> Result<bool, Error<Self::Err>> {
        (**self).try_optimistic_write(scope, data, version)
    }
}
