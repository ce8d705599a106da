//! Storage Module
//!
//! The uniform interface over code storage backends.
//!
//! ## Responsibilities
//! - Append batches of (identifiers, codes)
//! - Track item, empty-batch and batch counts
//! - Replay every batch in insertion order, from the start on each call
//!
//! ## Backends
//! ```text
//!                 ┌──────────────────┐
//!   add() ──────▶ │   CodeStorage    │ ──────▶ batches()
//!                 └────────┬─────────┘
//!             ┌────────────┴────────────┐
//!             ▼                         ▼
//!   ┌───────────────────┐     ┌───────────────────┐
//!   │  VolatileStorage  │     │ PersistentStorage │
//!   │   (Vec + Vec)     │     │ (keys/vals/info)  │
//!   └───────────────────┘     └───────────────────┘
//! ```
//!
//! `CodeStorage` is sealed: the two backends above (and the `Storage` enum
//! wrapping them) are its only implementations. The abstract contract has no
//! constructor; asking the registry for it fails with `NotInstantiable`.

mod persistent;
pub mod registry;
mod volatile;

pub use persistent::{PersistentBatches, PersistentStorage};
pub use registry::BackendKind;
pub use volatile::{VolatileBatches, VolatileStorage};

use crate::batch::{Batch, CodeBlock, IdentifierSet};
use crate::config::StorageConfig;
use crate::error::Result;

mod sealed {
    pub trait Sealed {}

    impl Sealed for super::VolatileStorage {}
    impl Sealed for super::PersistentStorage {}
    impl Sealed for super::Storage {}
}

/// Boxed batch iterator returned by `CodeStorage::batches`
pub type Batches<'a> = Box<dyn Iterator<Item = Result<Batch>> + 'a>;

/// Contract shared by every code storage backend
pub trait CodeStorage: sealed::Sealed {
    /// Append one batch
    ///
    /// Fails with `InvalidBatch` when the identifier count differs from the
    /// code block's row count. The column width is expected to be the same
    /// for every batch of one instance; that is not checked.
    fn add(&mut self, identifiers: IdentifierSet, codes: CodeBlock) -> Result<()>;

    /// Total rows across all stored batches
    fn num_items(&self) -> u64;

    /// Number of zero-row batches, `None` if the backend does not track it
    fn num_emptys(&self) -> Option<u64>;

    /// Number of stored batches
    fn num_batches(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.num_batches() == 0
    }

    /// Remove every batch and reset all counters
    fn clear(&mut self) -> Result<()>;

    /// Iterate all batches in insertion order, starting from the first
    fn batches(&self) -> Result<Batches<'_>>;
}

// =============================================================================
// Storage
// =============================================================================

/// The closed set of backends, selected at construction time
pub enum Storage {
    Volatile(VolatileStorage),
    Persistent(PersistentStorage),
}

impl Storage {
    /// Construct the backend named by `config.backend`
    pub fn open(config: &StorageConfig) -> Result<Self> {
        match config.backend {
            BackendKind::Volatile => Ok(Storage::Volatile(VolatileStorage::new())),
            BackendKind::Persistent => Ok(Storage::Persistent(PersistentStorage::open(
                config.persistent_options(),
            )?)),
        }
    }

    /// Construct a backend from its registry name, e.g. `"memory"` or `"redb"`
    pub fn open_named(name: &str, config: &StorageConfig) -> Result<Self> {
        let mut config = config.clone();
        config.backend = registry::lookup(name)?;
        Self::open(&config)
    }

    pub fn kind(&self) -> BackendKind {
        match self {
            Storage::Volatile(_) => BackendKind::Volatile,
            Storage::Persistent(_) => BackendKind::Persistent,
        }
    }

    /// Release backend resources; idempotent
    pub fn close(&mut self) {
        match self {
            Storage::Volatile(storage) => storage.close(),
            Storage::Persistent(storage) => storage.close(),
        }
    }
}

impl CodeStorage for Storage {
    fn add(&mut self, identifiers: IdentifierSet, codes: CodeBlock) -> Result<()> {
        match self {
            Storage::Volatile(storage) => storage.add(identifiers, codes),
            Storage::Persistent(storage) => storage.add(identifiers, codes),
        }
    }

    fn num_items(&self) -> u64 {
        match self {
            Storage::Volatile(storage) => storage.num_items(),
            Storage::Persistent(storage) => storage.num_items(),
        }
    }

    fn num_emptys(&self) -> Option<u64> {
        match self {
            Storage::Volatile(storage) => storage.num_emptys(),
            Storage::Persistent(storage) => storage.num_emptys(),
        }
    }

    fn num_batches(&self) -> u64 {
        match self {
            Storage::Volatile(storage) => storage.num_batches(),
            Storage::Persistent(storage) => storage.num_batches(),
        }
    }

    fn clear(&mut self) -> Result<()> {
        match self {
            Storage::Volatile(storage) => storage.clear(),
            Storage::Persistent(storage) => storage.clear(),
        }
    }

    fn batches(&self) -> Result<Batches<'_>> {
        match self {
            Storage::Volatile(storage) => storage.batches(),
            Storage::Persistent(storage) => storage.batches(),
        }
    }
}
