#[cfg(feature = "parking-lot")]
pub use parking_lot::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
#[cfg(not(feature = "parking-lot"))]
pub use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Acquires a lock guard, converting std poisoning into the crate error.
///
/// `parking_lot` locks never poison, so with the `parking-lot` feature the
/// expression is returned as is.
macro_rules! acquire {
    ($lock:expr) => {{
        #[cfg(feature = "parking-lot")]
        {
            $lock
        }
        #[cfg(not(feature = "parking-lot"))]
        {
            $lock?
        }
    }};
}

pub(crate) use acquire;
