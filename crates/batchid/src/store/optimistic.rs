use core::num::NonZeroU32;

#[cfg(feature = "tracing")]
use tracing::{instrument, warn};

use crate::{
    error::Error,
    store::{DataStore, OptimisticStore, Reservation},
};

/// Turns any [`OptimisticStore`] into a [`DataStore`].
///
/// Every reservation is one read followed by one version-checked write. The
/// stored value is validated before writing, so corrupt data never triggers a
/// write attempt.
///
/// # Example
///
/// ```
/// use batchid::{BatchIdGenerator, MemoryStore, OptimisticAdapter};
///
/// let generator = BatchIdGenerator::new(OptimisticAdapter::new(MemoryStore::new()));
/// assert_eq!(generator.next_id("invoices")?, 1);
/// # Ok::<(), batchid::Error>(())
/// ```
#[derive(Clone, Debug, Default)]
pub struct OptimisticAdapter<S> {
    inner: S,
}

impl<S> OptimisticAdapter<S> {
    /// Wraps `inner`.
    pub const fn new(inner: S) -> Self {
        Self { inner }
    }

    /// Returns the wrapped store.
    pub const fn inner(&self) -> &S {
        &self.inner
    }

    /// Unwraps the adapter.
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: OptimisticStore> DataStore for OptimisticAdapter<S> {
    type Err = S::Err;

    fn reserve_batch(
        &self,
        scope: &str,
        batch_size: NonZeroU32,
    ) -> Result<Reservation, Error<Self::Err>> {
        reserve_with_optimistic_write(&self.inner, scope, batch_size)
    }
}

/// Reserves one batch with a read followed by a version-checked write.
#[cfg_attr(feature = "tracing", instrument(level = "trace", skip(store)))]
pub(crate) fn reserve_with_optimistic_write<S>(
    store: &S,
    scope: &str,
    batch_size: NonZeroU32,
) -> Result<Reservation, Error<S::Err>>
where
    S: OptimisticStore + ?Sized,
{
    let current = store.get_data(scope)?;
    let start = parse_counter(scope, &current.data)?;
    let next = start
        .checked_add(i64::from(batch_size.get()))
        .ok_or_else(|| Error::Overflow {
            scope: scope.to_owned(),
            batch_size: batch_size.get(),
        })?;

    if store.try_optimistic_write(scope, &next.to_string(), &current.version)? {
        Ok(Reservation::Reserved { start })
    } else {
        Ok(Reservation::Conflict)
    }
}

/// Parses a persisted counter, accepting only positive decimal integers.
///
/// Surrounding whitespace is ignored.
///
/// # Errors
///
/// [`Error::DataCorruption`] naming `scope` and the raw data otherwise.
pub fn parse_counter<E>(scope: &str, raw: &str) -> Result<i64, Error<E>> {
    match raw.trim().parse::<i64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => {
            #[cfg(feature = "tracing")]
            warn!(scope, raw, "corrupt id counter");
            Err(Error::DataCorruption {
                scope: scope.to_owned(),
                raw: raw.to_owned(),
            })
        }
    }
}
