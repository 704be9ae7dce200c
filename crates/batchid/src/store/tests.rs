use crate::{
    DataStore, Error, MemoryStore, OptimisticAdapter, OptimisticStore, Reservation, SEED_VALUE,
    Versioned, parse_counter,
};
use core::num::NonZeroU32;
use std::collections::HashSet;
use std::io;
use std::sync::Mutex;
use std::thread::scope;

const SCOPE: &str = "test";

fn batch(size: u32) -> NonZeroU32 {
    NonZeroU32::new(size).unwrap()
}

/// Reserves until a batch is won, returning its start.
fn reserve_until_won<S: DataStore>(store: &S, scope: &str, batch_size: NonZeroU32) -> i64
where
    S::Err: core::fmt::Debug,
{
    loop {
        match store.reserve_batch(scope, batch_size).unwrap() {
            Reservation::Reserved { start } => break start,
            Reservation::Conflict => std::thread::yield_now(),
        }
    }
}

/// An optimistic store whose reads fail with an I/O error.
struct UnreachableStore;

impl OptimisticStore for UnreachableStore {
    type Version = ();
    type Err = io::Error;

    fn get_data(&self, _scope: &str) -> Result<Versioned<()>, Error<io::Error>> {
        Err(Error::Store(io::Error::new(
            io::ErrorKind::ConnectionRefused,
            "store unreachable",
        )))
    }

    fn try_optimistic_write(&self, _: &str, _: &str, _: &()) -> Result<bool, Error<io::Error>> {
        unreachable!("write attempted after a failed read")
    }
}

/// Wraps a [`MemoryStore`] and lets another writer slip in between the read
/// and the conditional write.
struct RacingStore {
    inner: MemoryStore,
    interleave: Mutex<Option<String>>,
}

impl OptimisticStore for RacingStore {
    type Version = u64;
    type Err = core::convert::Infallible;

    fn get_data(&self, scope: &str) -> Result<Versioned<u64>, Error<Self::Err>> {
        let data = self.inner.get_data(scope)?;
        if let Some(foreign) = self.interleave.lock().unwrap().take() {
            self.inner.put_raw(scope, foreign);
        }
        Ok(data)
    }

    fn try_optimistic_write(
        &self,
        scope: &str,
        data: &str,
        version: &u64,
    ) -> Result<bool, Error<Self::Err>> {
        self.inner.try_optimistic_write(scope, data, version)
    }
}

#[test]
fn memory_store_does_not_create_records_eagerly() {
    let store = MemoryStore::new();
    assert_eq!(store.persisted(SCOPE), None);
    assert_eq!(store.version(SCOPE), None);
}

#[test]
fn memory_store_seeds_on_first_read() {
    let store = MemoryStore::new();
    let data = store.get_data(SCOPE).unwrap();
    assert_eq!(data.data, SEED_VALUE.to_string());
    assert_eq!(store.persisted(SCOPE).as_deref(), Some("1"));
}

#[test]
fn memory_store_rejects_stale_versions() {
    let store = MemoryStore::new();
    let first = store.get_data(SCOPE).unwrap();

    assert!(store.try_optimistic_write(SCOPE, "4", &first.version).unwrap());
    assert!(!store.try_optimistic_write(SCOPE, "99", &first.version).unwrap());
    assert_eq!(store.persisted(SCOPE).as_deref(), Some("4"));

    let second = store.get_data(SCOPE).unwrap();
    assert_ne!(second.version, first.version);
    assert!(store.try_optimistic_write(SCOPE, "7", &second.version).unwrap());
}

#[test]
fn memory_store_rejects_writes_to_missing_records() {
    let store = MemoryStore::new();
    assert!(!store.try_optimistic_write(SCOPE, "4", &0).unwrap());
    assert_eq!(store.persisted(SCOPE), None);
}

#[test]
fn reserve_batch_creates_the_record_and_advances_it() {
    let store = MemoryStore::new();

    assert_eq!(
        store.reserve_batch(SCOPE, batch(3)).unwrap(),
        Reservation::Reserved { start: 1 }
    );
    assert_eq!(store.persisted(SCOPE).as_deref(), Some("4"));

    assert_eq!(
        store.reserve_batch(SCOPE, batch(3)).unwrap(),
        Reservation::Reserved { start: 4 }
    );
    assert_eq!(store.persisted(SCOPE).as_deref(), Some("7"));
}

#[test]
fn reserve_batch_reports_conflict_when_another_writer_wins() {
    let store = RacingStore {
        inner: MemoryStore::new(),
        interleave: Mutex::new(Some("10".to_owned())),
    };
    let adapter = OptimisticAdapter::new(store);

    assert_eq!(
        adapter.reserve_batch(SCOPE, batch(3)).unwrap(),
        Reservation::Conflict
    );
    // the winner's value is kept, the loser re-reads it on the next attempt
    assert_eq!(adapter.inner().inner.persisted(SCOPE).as_deref(), Some("10"));
    assert_eq!(
        adapter.reserve_batch(SCOPE, batch(3)).unwrap(),
        Reservation::Reserved { start: 10 }
    );
    assert_eq!(adapter.inner().inner.persisted(SCOPE).as_deref(), Some("13"));
}

#[test]
fn corrupt_data_fails_without_writing() {
    for raw in ["abc", "", "0", "-5", "1.5"] {
        let store = MemoryStore::new();
        store.put_raw(SCOPE, raw);
        let version = store.version(SCOPE);

        let err = store.reserve_batch(SCOPE, batch(3)).unwrap_err();
        match err {
            Error::DataCorruption { scope, raw: found } => {
                assert_eq!(scope, SCOPE);
                assert_eq!(found, raw);
            }
            other => panic!("unexpected error for {raw:?}: {other:?}"),
        }
        assert_eq!(store.version(SCOPE), version);
        assert_eq!(store.persisted(SCOPE).as_deref(), Some(raw));
    }
}

#[test]
fn corrupt_data_error_names_scope_and_value() {
    let store = MemoryStore::new();
    store.put_raw(SCOPE, "abc");
    let message = store.reserve_batch(SCOPE, batch(1)).unwrap_err().to_string();
    assert!(message.contains("'test'"), "{message}");
    assert!(message.contains("\"abc\""), "{message}");
}

#[test]
fn counter_overflow_is_reported() {
    let store = MemoryStore::new();
    store.put_raw(SCOPE, (i64::MAX - 1).to_string());

    assert!(matches!(
        store.reserve_batch(SCOPE, batch(3)),
        Err(Error::Overflow { batch_size: 3, .. })
    ));
}

#[test]
fn backend_errors_propagate_unchanged() {
    let adapter = OptimisticAdapter::new(UnreachableStore);
    match adapter.reserve_batch(SCOPE, batch(3)) {
        Err(Error::Store(e)) => assert_eq!(e.kind(), io::ErrorKind::ConnectionRefused),
        other => panic!("expected store error, got {other:?}"),
    }
}

#[test]
fn store_error_is_exposed_as_source() {
    use std::error::Error as _;

    let err = OptimisticAdapter::new(UnreachableStore)
        .reserve_batch(SCOPE, batch(1))
        .unwrap_err();
    let source = err.source().expect("store error has a source");
    assert_eq!(source.to_string(), "store unreachable");
}

#[test]
fn parse_counter_accepts_padded_positive_values() {
    assert_eq!(parse_counter::<()>(SCOPE, "42").unwrap(), 42);
    assert_eq!(parse_counter::<()>(SCOPE, " 7\n").unwrap(), 7);
    assert!(parse_counter::<()>(SCOPE, "0").unwrap_err().is_data_corruption());
}

#[test]
fn raw_sentinel_round_trips() {
    assert_eq!(Reservation::from_raw(-1), Some(Reservation::Conflict));
    assert_eq!(Reservation::from_raw(5), Some(Reservation::Reserved { start: 5 }));
    assert_eq!(Reservation::from_raw(0), None);
    assert_eq!(Reservation::from_raw(-2), None);
    assert_eq!(Reservation::Conflict.to_raw(), Reservation::CONFLICT_SENTINEL);
}

#[test]
fn concurrent_reservations_are_disjoint() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 200;
    let batch_size = batch(5);
    let store = MemoryStore::new();

    let starts = Mutex::new(Vec::with_capacity(THREADS * PER_THREAD));
    scope(|s| {
        for _ in 0..THREADS {
            s.spawn(|| {
                for _ in 0..PER_THREAD {
                    let start = reserve_until_won(&store, SCOPE, batch_size);
                    starts.lock().unwrap().push(start);
                }
            });
        }
    });

    let mut starts = starts.into_inner().unwrap();
    starts.sort_unstable();
    assert_eq!(starts.len(), THREADS * PER_THREAD);
    assert_eq!(starts.iter().collect::<HashSet<_>>().len(), starts.len());
    for pair in starts.windows(2) {
        assert_eq!(pair[1] - pair[0], 5, "ranges overlap or leave gaps: {pair:?}");
    }

    let expected_next = SEED_VALUE + (THREADS * PER_THREAD * 5) as i64;
    assert_eq!(store.persisted(SCOPE), Some(expected_next.to_string()));
}
