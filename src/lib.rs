//! # pqstore
//!
//! Storage for product-quantization code batches with:
//! - A volatile in-memory backend
//! - A persistent backend over an embedded transactional database
//! - Insertion-ordered, restartable iteration that survives restarts
//! - Versioned, checksummed on-disk encoding of identifiers and codes
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │              Producer (quantizer) / Consumer (loader)        │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ add(ids, codes) / batches()
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                 CodeStorage (sealed trait)                   │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │  Volatile   │          │ Persistent  │
//!   │ (Vec, Vec)  │          │ (KvTable x3)│
//!   └─────────────┘          └──────┬──────┘
//!                                   │
//!                                   ▼
//!                           ┌─────────────┐
//!                           │    redb     │
//!                           │ codes.redb  │
//!                           └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod batch;
pub mod codec;
pub mod kv;
pub mod storage;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use batch::{Batch, CodeBlock, CodeData, ElementType, IdentifierSet, ItemId};
pub use config::{PersistentOptions, StorageConfig};
pub use error::{Result, StoreError};
pub use storage::{BackendKind, CodeStorage, PersistentStorage, Storage, VolatileStorage};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of pqstore
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
