//! # batchid
//!
//! Unique, monotonically issued `i64` identifiers per *scope*, handed out from
//! batches reserved against a shared, versioned counter record.
//!
//! Each scope has one persisted counter holding the first id nobody has
//! reserved yet. A [`BatchIdGenerator`] reserves `batch_size` ids at a time
//! with a version-checked write and then serves them from memory, so any
//! number of generators (threads, processes, machines) can share one store
//! without ever issuing the same id twice.
//!
//! ```
//! use batchid::{BatchIdGenerator, GeneratorConfig, MemoryStore};
//!
//! let config = GeneratorConfig::new().with_batch_size(3)?;
//! let generator = BatchIdGenerator::with_config(MemoryStore::new(), config);
//!
//! assert_eq!(generator.next_id("orders")?, 1);
//! assert_eq!(generator.next_id("orders")?, 2);
//! assert_eq!(generator.store().persisted("orders").as_deref(), Some("4"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `parking-lot`: use `parking_lot` locks instead of `std::sync` (no lock
//!   poisoning).
//! - `cache-padded`: pad every scope cursor lock to a cache line.
//! - `tracing`: emit `tracing` spans and events on the allocation path.
//! - `serde`: derive `Serialize`/`Deserialize` for [`GeneratorConfig`].
#![forbid(unsafe_code)]

mod config;
mod error;
mod generator;
mod store;

pub use crate::config::*;
pub use crate::error::*;
pub use crate::generator::*;
pub use crate::store::*;
