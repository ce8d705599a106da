//! KV Module
//!
//! Named tables over a shared transactional environment.
//!
//! ## Responsibilities
//! - Open or create the embedded database under a root directory
//! - Hand out per-table handles sharing that database
//! - Run each handle call in its own scoped transaction
//!
//! ## On-Disk Layout
//! ```text
//! {path}/
//!   └── codes.redb
//!         ├── keys    (sequence key → identifier set)
//!         ├── vals    (sequence key → code block)
//!         └── info    (counter name → i32)
//! ```

mod environment;
mod table;

pub use environment::Environment;
pub use table::KvTable;

/// Table definition shared by every handle: raw byte keys and values
pub(crate) type RawTable<'a> = redb::TableDefinition<'a, &'static [u8], &'static [u8]>;
