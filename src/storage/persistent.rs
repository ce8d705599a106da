//! Persistent backend
//!
//! Stores batches in an embedded transactional database under three tables:
//!
//! | table | key                          | value                    |
//! |-------|------------------------------|--------------------------|
//! | keys  | zero-padded batch index      | encoded identifier set   |
//! | vals  | zero-padded batch index      | encoded code block       |
//! | info  | counter name                 | i32, native byte order   |
//!
//! The batch index, not the running item count, forms the key, so a batch
//! with zero rows never collides with its successor. Counters live in `info`
//! and are reloaded on open, which makes item counts survive restarts.

use std::ops::Bound;
use std::path::Path;

use redb::{ReadOnlyTable, ReadTransaction, ReadableTable, Table};
use tracing::{debug, info, warn};

use crate::batch::{Batch, CodeBlock, IdentifierSet};
use crate::codec::{self, sequence, Scalar};
use crate::config::PersistentOptions;
use crate::error::{Result, StoreError};
use crate::kv::{Environment, KvTable};

use super::{Batches, CodeStorage};

// =============================================================================
// Table and Counter Names
// =============================================================================

const KEYS_TABLE: &str = "keys";
const VALS_TABLE: &str = "vals";
const INFO_TABLE: &str = "info";

const NUM_ITEMS: &[u8] = b"num_items";
const NUM_EMPTYS: &[u8] = b"num_emptys";
const NUM_BATCHES: &[u8] = b"num_batches";
const KEY_DIGITS: &[u8] = b"key_digits";

type WriteTable<'txn> = Table<'txn, &'static [u8], &'static [u8]>;
type ReadTable = ReadOnlyTable<&'static [u8], &'static [u8]>;

/// Durable code storage
pub struct PersistentStorage {
    options: PersistentOptions,

    /// Shared database, `None` once closed
    env: Option<Environment>,

    /// Identifier sets by sequence key
    db_keys: KvTable,

    /// Code blocks by sequence key
    db_vals: KvTable,

    /// Counters
    db_info: KvTable,

    num_items: u64,
    num_emptys: u64,
    num_batches: u64,
}

impl PersistentStorage {
    /// Open or create storage at `options.path`
    ///
    /// On open:
    /// 1. Open the database and the three tables
    /// 2. Clear everything if `clear_on_open` is set
    /// 3. Load counters from `info`, initialising missing ones
    pub fn open(options: PersistentOptions) -> Result<Self> {
        // Reject an unusable key width before touching disk
        sequence::capacity(options.key_digits)?;

        let env = Environment::open(&options.path, options.cache_size)?;
        let db_keys = env.table(KEYS_TABLE)?;
        let db_vals = env.table(VALS_TABLE)?;
        let db_info = env.table(INFO_TABLE)?;

        let mut storage = Self {
            options,
            env: Some(env),
            db_keys,
            db_vals,
            db_info,
            num_items: 0,
            num_emptys: 0,
            num_batches: 0,
        };

        if storage.options.clear_on_open {
            storage.clear()?;
        }

        storage.load_counters()?;

        info!(
            path = %storage.options.path.display(),
            num_items = storage.num_items,
            num_batches = storage.num_batches,
            "persistent storage opened"
        );

        Ok(storage)
    }

    /// Open at `path` with default options
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(PersistentOptions::new(path))
    }

    /// Concretely typed batch iterator over one read snapshot
    pub fn iter(&self) -> Result<PersistentBatches> {
        let txn = self.env()?.database().begin_read()?;
        let keys = txn.open_table(self.db_keys.definition())?;
        let vals = txn.open_table(self.db_vals.definition())?;

        Ok(PersistentBatches {
            keys,
            vals,
            last_key: None,
            done: false,
            _txn: txn,
        })
    }

    /// Release the tables and the database; safe to call repeatedly
    pub fn close(&mut self) {
        if self.env.is_none() {
            return;
        }

        self.db_keys.close();
        self.db_vals.close();
        self.db_info.close();
        self.env = None;

        info!(path = %self.options.path.display(), "persistent storage closed");
    }

    pub fn is_closed(&self) -> bool {
        self.env.is_none()
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Root directory of this store
    pub fn path(&self) -> &Path {
        &self.options.path
    }

    pub fn options(&self) -> &PersistentOptions {
        &self.options
    }

    /// Table handle for identifier sets
    pub fn keys_table(&self) -> &KvTable {
        &self.db_keys
    }

    /// Table handle for code blocks
    pub fn vals_table(&self) -> &KvTable {
        &self.db_vals
    }

    /// Table handle for counters
    pub fn info_table(&self) -> &KvTable {
        &self.db_info
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn env(&self) -> Result<&Environment> {
        self.env.as_ref().ok_or(StoreError::Closed)
    }

    /// Read counters from `info`, persisting defaults for missing ones
    fn load_counters(&mut self) -> Result<()> {
        match self.read_counter(KEY_DIGITS)? {
            Some(digits) if digits != self.options.key_digits as u64 => {
                return Err(StoreError::Config(format!(
                    "store at {} uses {}-digit keys, configured for {}",
                    self.options.path.display(),
                    digits,
                    self.options.key_digits
                )));
            }
            Some(_) => {}
            None => self.write_counter(KEY_DIGITS, self.options.key_digits as u64)?,
        }

        self.num_items = self.load_or_init(NUM_ITEMS, 0)?;
        self.num_emptys = self.load_or_init(NUM_EMPTYS, 0)?;

        // Keys may have gaps (legacy item-count keys, removed batches), so the
        // next index comes from the last key, never from the number of keys
        let next_free = self.next_free_index()?;
        self.num_batches = match self.read_counter(NUM_BATCHES)? {
            Some(recorded) if recorded >= next_free => recorded,
            recorded => {
                if let Some(recorded) = recorded {
                    warn!(
                        recorded,
                        next_free,
                        "batch counter behind keys table, resuming after last key"
                    );
                }
                self.write_counter(NUM_BATCHES, next_free)?;
                next_free
            }
        };

        Ok(())
    }

    /// One past the index of the last key in `keys`, 0 when it is empty
    fn next_free_index(&self) -> Result<u64> {
        let txn = self.env()?.database().begin_read()?;
        let keys = txn.open_table(self.db_keys.definition())?;

        let last = match keys.last()? {
            Some((key, _)) => Some(sequence::decode(key.value())?),
            None => None,
        };

        match last {
            Some(index) => index.checked_add(1).ok_or_else(|| {
                StoreError::Capacity(format!("batch index {} has no successor", index))
            }),
            None => Ok(0),
        }
    }

    fn load_or_init(&self, name: &[u8], default: u64) -> Result<u64> {
        match self.read_counter(name)? {
            Some(value) => Ok(value),
            None => {
                self.write_counter(name, default)?;
                Ok(default)
            }
        }
    }

    fn read_counter(&self, name: &[u8]) -> Result<Option<u64>> {
        match self.db_info.get_scalar_value::<i32>(name)? {
            Some(value) => u64::try_from(value).map(Some).map_err(|_| {
                StoreError::Corruption(format!(
                    "negative counter {}: {}",
                    String::from_utf8_lossy(name),
                    value
                ))
            }),
            None => Ok(None),
        }
    }

    fn write_counter(&self, name: &[u8], value: u64) -> Result<()> {
        self.db_info.set_scalar_value(name, to_counter(name, value)?)
    }

    /// Fail if writing `incoming` more bytes would pass `max_size`
    fn check_capacity(&self, incoming: usize) -> Result<()> {
        let current = self.env()?.file_size()?;
        if current.saturating_add(incoming as u64) > self.options.max_size {
            return Err(StoreError::Capacity(format!(
                "database is {} bytes, adding {} would exceed the {} byte limit",
                current, incoming, self.options.max_size
            )));
        }
        Ok(())
    }
}

impl CodeStorage for PersistentStorage {
    /// Append one batch
    ///
    /// The identifier set, the code block and the updated counters are
    /// written in a single transaction; in-memory counters change only after
    /// it commits.
    fn add(&mut self, identifiers: IdentifierSet, codes: CodeBlock) -> Result<()> {
        let batch = Batch::new(identifiers, codes)?;
        let key = sequence::encode(self.num_batches, self.options.key_digits)?;

        let rows = batch.rows() as u64;
        let num_items = self.num_items + rows;
        let num_emptys = self.num_emptys + u64::from(rows == 0);
        let num_batches = self.num_batches + 1;

        let ids_blob = codec::encode_identifiers(&batch.identifiers)?;
        let codes_blob = codec::encode_codes(&batch.codes)?;
        self.check_capacity(ids_blob.len() + codes_blob.len())?;

        let txn = self.env()?.database().begin_write()?;
        {
            let mut keys = txn.open_table(self.db_keys.definition())?;
            keys.insert(key.as_slice(), ids_blob.as_slice())?;

            let mut vals = txn.open_table(self.db_vals.definition())?;
            vals.insert(key.as_slice(), codes_blob.as_slice())?;

            let mut info = txn.open_table(self.db_info.definition())?;
            put_counter(&mut info, NUM_ITEMS, num_items)?;
            put_counter(&mut info, NUM_EMPTYS, num_emptys)?;
            put_counter(&mut info, NUM_BATCHES, num_batches)?;
        }
        txn.commit()?;

        self.num_items = num_items;
        self.num_emptys = num_emptys;
        self.num_batches = num_batches;

        debug!(
            key = %String::from_utf8_lossy(&key),
            rows,
            bytes = ids_blob.len() + codes_blob.len(),
            "batch added"
        );
        Ok(())
    }

    fn num_items(&self) -> u64 {
        self.num_items
    }

    fn num_emptys(&self) -> Option<u64> {
        Some(self.num_emptys)
    }

    fn num_batches(&self) -> u64 {
        self.num_batches
    }

    /// Drop every entry of all three tables in one transaction
    ///
    /// The tables and the database file stay in place.
    fn clear(&mut self) -> Result<()> {
        let txn = self.env()?.database().begin_write()?;
        for table in [&self.db_keys, &self.db_vals, &self.db_info] {
            let mut table = txn.open_table(table.definition())?;
            clear_table(&mut table)?;
        }
        {
            let mut info = txn.open_table(self.db_info.definition())?;
            put_counter(&mut info, NUM_ITEMS, 0)?;
            put_counter(&mut info, NUM_EMPTYS, 0)?;
            put_counter(&mut info, NUM_BATCHES, 0)?;
            put_counter(&mut info, KEY_DIGITS, self.options.key_digits as u64)?;
        }
        txn.commit()?;

        self.num_items = 0;
        self.num_emptys = 0;
        self.num_batches = 0;

        info!(path = %self.options.path.display(), "persistent storage cleared");
        Ok(())
    }

    fn batches(&self) -> Result<Batches<'_>> {
        Ok(Box::new(self.iter()?))
    }
}

impl Drop for PersistentStorage {
    fn drop(&mut self) {
        self.close();
    }
}

// =============================================================================
// Iteration
// =============================================================================

/// Lockstep cursor over the `keys` and `vals` tables
///
/// Holds one read transaction for its whole life, so batches added after it
/// was created are not visible to it. The transaction ends when the iterator
/// is dropped.
pub struct PersistentBatches {
    keys: ReadTable,
    vals: ReadTable,

    /// Last sequence key yielded; each step resumes strictly after it
    last_key: Option<Vec<u8>>,

    done: bool,

    // Declared last so the tables drop before the snapshot they read from
    _txn: ReadTransaction,
}

impl PersistentBatches {
    /// Advance both cursors, returning the shared key and both blobs
    fn advance(&mut self) -> Result<Option<(Vec<u8>, Vec<u8>, Vec<u8>)>> {
        let after = self.last_key.as_deref();

        let Some((key, ids_blob)) = next_entry(&self.keys, after)? else {
            return Ok(None);
        };
        let Some((val_key, codes_blob)) = next_entry(&self.vals, after)? else {
            return Ok(None);
        };

        if key != val_key {
            return Err(StoreError::Corruption(format!(
                "keys table at {:?} but vals table at {:?}",
                String::from_utf8_lossy(&key),
                String::from_utf8_lossy(&val_key)
            )));
        }

        self.last_key = Some(key.clone());
        Ok(Some((key, ids_blob, codes_blob)))
    }
}

impl Iterator for PersistentBatches {
    type Item = Result<Batch>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let (key, ids_blob, codes_blob) = match self.advance() {
            Ok(Some(entry)) => entry,
            Ok(None) => {
                self.done = true;
                return None;
            }
            Err(e) => {
                self.done = true;
                return Some(Err(e));
            }
        };

        // A batch that fails to decode is reported; later batches stay readable
        Some(decode_batch(&key, &ids_blob, &codes_blob))
    }
}

/// First entry of `table` strictly after `after` (or the very first entry)
///
/// redb ranges borrow their table, so instead of keeping one open range the
/// cursor re-seeks past the last yielded key on every step.
fn next_entry(table: &ReadTable, after: Option<&[u8]>) -> Result<Option<(Vec<u8>, Vec<u8>)>> {
    let mut range = match after {
        Some(key) => table.range::<&[u8]>((Bound::Excluded(key), Bound::Unbounded))?,
        None => table.iter()?,
    };

    match range.next() {
        Some(entry) => {
            let (key, value) = entry?;
            Ok(Some((key.value().to_vec(), value.value().to_vec())))
        }
        None => Ok(None),
    }
}

fn decode_batch(key: &[u8], ids_blob: &[u8], codes_blob: &[u8]) -> Result<Batch> {
    let with_key = |e: StoreError| match e {
        StoreError::Serialization(msg) => StoreError::Serialization(format!(
            "batch {}: {}",
            String::from_utf8_lossy(key),
            msg
        )),
        StoreError::Corruption(msg) => {
            StoreError::Corruption(format!("batch {}: {}", String::from_utf8_lossy(key), msg))
        }
        other => other,
    };

    let identifiers = codec::decode_identifiers(ids_blob).map_err(with_key)?;
    let codes = codec::decode_codes(codes_blob).map_err(with_key)?;
    Batch::new(identifiers, codes).map_err(with_key)
}

// =============================================================================
// Table Helpers
// =============================================================================

fn to_counter(name: &[u8], value: u64) -> Result<i32> {
    i32::try_from(value).map_err(|_| {
        StoreError::Capacity(format!(
            "counter {} = {} exceeds the 32-bit limit",
            String::from_utf8_lossy(name),
            value
        ))
    })
}

fn put_counter(table: &mut WriteTable<'_>, name: &[u8], value: u64) -> Result<()> {
    table.insert(name, to_counter(name, value)?.pack().as_slice())?;
    Ok(())
}

fn clear_table(table: &mut WriteTable<'_>) -> Result<()> {
    let keys = table
        .iter()?
        .map(|entry| entry.map(|(key, _)| key.value().to_vec()))
        .collect::<std::result::Result<Vec<_>, redb::StorageError>>()?;

    for key in &keys {
        table.remove(key.as_slice())?;
    }
    Ok(())
}
