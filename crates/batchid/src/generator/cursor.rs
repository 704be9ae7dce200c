use core::num::NonZeroU32;

#[cfg(not(feature = "parking-lot"))]
use crate::generator::PoisonError;
use crate::generator::{Mutex, MutexGuard};

/// Process-local allocation state for one scope.
///
/// `last_issued` is the highest id already handed to a caller and
/// `batch_ceiling` the highest id currently reserved. Both start at zero, which
/// reads as an exhausted range and forces a refill on first use.
///
/// Invariant: `last_issued <= batch_ceiling`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScopeCursor {
    last_issued: i64,
    batch_ceiling: i64,
}

impl ScopeCursor {
    /// A cursor that has not reserved anything yet.
    pub const fn new() -> Self {
        Self {
            last_issued: 0,
            batch_ceiling: 0,
        }
    }

    /// Highest id already handed out, or `0` before first use.
    pub const fn last_issued(&self) -> i64 {
        self.last_issued
    }

    /// Highest id reserved for this cursor, or `0` before first use.
    pub const fn batch_ceiling(&self) -> i64 {
        self.batch_ceiling
    }

    /// Number of reserved ids that have not been issued yet.
    pub const fn remaining(&self) -> i64 {
        self.batch_ceiling - self.last_issued
    }

    /// Returns `true` if every reserved id has been issued.
    pub const fn is_exhausted(&self) -> bool {
        self.last_issued == self.batch_ceiling
    }

    /// Points the cursor at a freshly reserved batch `start..=start + size - 1`.
    ///
    /// Returns `None` and leaves the cursor unchanged if the last id of the
    /// batch does not fit in an `i64`. `start` must be positive.
    pub(crate) fn reset_to_batch(&mut self, start: i64, batch_size: NonZeroU32) -> Option<()> {
        debug_assert!(start > 0);
        let last_issued = start.checked_sub(1)?;
        let batch_ceiling = last_issued.checked_add(i64::from(batch_size.get()))?;
        self.last_issued = last_issued;
        self.batch_ceiling = batch_ceiling;
        Some(())
    }

    /// Issues the next id of the current batch.
    ///
    /// Must only be called when the cursor is not exhausted.
    pub(crate) fn advance(&mut self) -> i64 {
        debug_assert!(!self.is_exhausted());
        self.last_issued += 1;
        self.last_issued
    }
}

/// The lock guarding a single [`ScopeCursor`].
#[cfg(feature = "cache-padded")]
pub(crate) type CursorCell = crossbeam_utils::CachePadded<Mutex<ScopeCursor>>;
#[cfg(not(feature = "cache-padded"))]
pub(crate) type CursorCell = Mutex<ScopeCursor>;

pub(crate) fn new_cursor_cell() -> CursorCell {
    #[cfg(feature = "cache-padded")]
    {
        crossbeam_utils::CachePadded::new(Mutex::new(ScopeCursor::new()))
    }
    #[cfg(not(feature = "cache-padded"))]
    {
        Mutex::new(ScopeCursor::new())
    }
}

/// Locks a cursor cell, recovering the guard if the lock was poisoned.
///
/// A cursor is only written once a reservation has succeeded, so a panic in
/// the store while the lock is held leaves it in its last consistent state.
pub(crate) fn lock_cursor(cell: &CursorCell) -> MutexGuard<'_, ScopeCursor> {
    #[cfg(feature = "parking-lot")]
    {
        cell.lock()
    }
    #[cfg(not(feature = "parking-lot"))]
    {
        cell.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_cursor_is_exhausted() {
        let cursor = ScopeCursor::new();
        assert!(cursor.is_exhausted());
        assert_eq!(cursor.remaining(), 0);
        assert_eq!(cursor, ScopeCursor::default());
    }

    #[test]
    fn batch_bounds_are_inclusive() {
        let mut cursor = ScopeCursor::new();
        cursor.reset_to_batch(4, NonZeroU32::new(3).unwrap()).unwrap();

        assert_eq!(cursor.last_issued(), 3);
        assert_eq!(cursor.batch_ceiling(), 6);
        assert_eq!(cursor.advance(), 4);
        assert_eq!(cursor.advance(), 5);
        assert_eq!(cursor.advance(), 6);
        assert!(cursor.is_exhausted());
    }

    #[test]
    fn batch_ending_at_i64_max_fits() {
        let mut cursor = ScopeCursor::new();
        cursor
            .reset_to_batch(i64::MAX - 2, NonZeroU32::new(3).unwrap())
            .unwrap();

        assert_eq!(cursor.batch_ceiling(), i64::MAX);
        assert_eq!(cursor.advance(), i64::MAX - 2);
    }

    #[test]
    fn batch_past_i64_max_is_rejected() {
        let mut cursor = ScopeCursor::new();
        assert_eq!(
            cursor.reset_to_batch(i64::MAX - 1, NonZeroU32::new(3).unwrap()),
            None
        );
        assert_eq!(cursor, ScopeCursor::new());
    }
}
