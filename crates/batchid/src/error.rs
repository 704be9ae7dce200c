use core::convert::Infallible;

/// A result type defaulting to the crate [`Error`] with an infallible store.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All error variants that `batchid` can emit.
///
/// The generic parameter `E` is the error type of the underlying store (see
/// [`DataStore::Err`]). Store failures are carried unchanged in
/// [`Error::Store`] and are never interpreted as contention.
///
/// [`DataStore::Err`]: crate::DataStore::Err
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error<E = Infallible> {
    /// An empty scope name was passed to `next_id`.
    #[error("scope name must not be empty")]
    EmptyScope,

    /// The store returned a counter that is not a positive integer.
    ///
    /// Retrying cannot repair corrupt data, so this is surfaced immediately
    /// and no write is attempted.
    #[error(
        "the id seed returned from the store for scope '{scope}' was corrupt and could not be \
         parsed as a positive integer; the data returned was: {raw:?}"
    )]
    DataCorruption {
        /// Scope whose counter is corrupt.
        scope: String,
        /// Raw data as returned by the store.
        raw: String,
    },

    /// Every reservation attempt of a refill lost the race against another
    /// writer.
    ///
    /// This is the expected outcome under sustained contention. Callers may
    /// retry, ideally after raising the batch size.
    #[error(
        "failed to update the data store after {attempts} attempts; this likely represents too \
         much contention against the store, increase the batch size to a value more appropriate \
         to your generation load"
    )]
    Contention {
        /// Number of reservation attempts made before giving up.
        attempts: u32,
    },

    /// Advancing the counter by one batch would overflow `i64`.
    #[error("the counter for scope '{scope}' cannot advance by {batch_size} without overflowing")]
    Overflow {
        /// Scope whose counter is exhausted.
        scope: String,
        /// Batch size of the rejected reservation.
        batch_size: u32,
    },

    /// The operation failed because a lock was **poisoned**.
    ///
    /// This occurs when a thread panics while holding a lock. With the
    /// `parking-lot` feature locks do **not** poison and this variant is never
    /// constructed.
    #[error("lock poisoned")]
    LockPoisoned,

    /// The store failed for a reason other than a version conflict.
    #[error("store operation failed")]
    Store(#[source] E),
}

impl<E> Error<E> {
    /// Returns `true` if the error is [`Error::Contention`], i.e. calling
    /// again may succeed.
    pub const fn is_contention(&self) -> bool {
        matches!(self, Self::Contention { .. })
    }

    /// Returns `true` if the error is [`Error::DataCorruption`].
    pub const fn is_data_corruption(&self) -> bool {
        matches!(self, Self::DataCorruption { .. })
    }
}

/// Invalid configuration, reported at the moment it is set.
///
/// Returned by the [`GeneratorConfig`] setters and loaders, before any
/// generator exists.
///
/// [`GeneratorConfig`]: crate::GeneratorConfig
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// `batch_size` must be a positive number.
    #[error("batch size must be a positive number")]
    ZeroBatchSize,

    /// `max_write_attempts` must be a positive number.
    #[error("max write attempts must be a positive number")]
    ZeroMaxWriteAttempts,

    /// A configuration value could not be parsed.
    #[error("invalid value {value:?} for {key}")]
    InvalidValue {
        /// The key (e.g. environment variable) that held the value.
        key: &'static str,
        /// The rejected value.
        value: String,
    },
}

#[cfg(not(feature = "parking-lot"))]
use crate::generator::{MutexGuard, PoisonError, RwLockReadGuard, RwLockWriteGuard};

// Convert all poisoned lock errors to a simplified `LockPoisoned`
#[cfg(not(feature = "parking-lot"))]
impl<T, E> From<PoisonError<MutexGuard<'_, T>>> for Error<E> {
    fn from(_: PoisonError<MutexGuard<'_, T>>) -> Self {
        Self::LockPoisoned
    }
}

#[cfg(not(feature = "parking-lot"))]
impl<T, E> From<PoisonError<RwLockReadGuard<'_, T>>> for Error<E> {
    fn from(_: PoisonError<RwLockReadGuard<'_, T>>) -> Self {
        Self::LockPoisoned
    }
}

#[cfg(not(feature = "parking-lot"))]
impl<T, E> From<PoisonError<RwLockWriteGuard<'_, T>>> for Error<E> {
    fn from(_: PoisonError<RwLockWriteGuard<'_, T>>) -> Self {
        Self::LockPoisoned
    }
}
