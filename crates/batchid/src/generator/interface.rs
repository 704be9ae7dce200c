use core::fmt;

/// A minimal interface for generators issuing unique ids per scope.
pub trait ScopedIdGenerator {
    /// The error type returned by [`ScopedIdGenerator::next_id`].
    type Err: fmt::Debug;

    /// Returns an id never returned before for `scope` by any generator
    /// sharing the same backing store.
    ///
    /// # Errors
    ///
    /// Implementation specific; see the implementing type.
    fn next_id(&self, scope: &str) -> Result<i64, Self::Err>;
}

impl<G: ScopedIdGenerator + ?Sized> ScopedIdGenerator for &G {
    type Err = G::Err;

    fn next_id(&self, scope: &str) -> Result<i64, Self::Err> {
        (**self).next_id(scope)
    }
}
