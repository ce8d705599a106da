//! KV table handle
//!
//! A named table bound to a shared database. Every call runs in its own
//! transaction: writes commit on success and abort on error, reads see the
//! latest committed state. No call spans more than one transaction, so a
//! sequence of calls is not atomic as a whole.

use std::sync::Arc;

use redb::{Database, ReadableTable, ReadableTableMetadata, Table};

use crate::codec::Scalar;
use crate::error::{Result, StoreError};

use super::RawTable;

/// Handle to one named table
pub struct KvTable {
    /// Table name inside the database
    name: String,

    /// Shared database, `None` once closed
    db: Option<Arc<Database>>,
}

impl KvTable {
    pub(crate) fn new(name: &str, db: Arc<Database>) -> Self {
        Self {
            name: name.to_string(),
            db: Some(db),
        }
    }

    // =========================================================================
    // Raw Access
    // =========================================================================

    /// Write or overwrite `key`
    pub fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.write(|table| {
            table.insert(key, value)?;
            Ok(())
        })
    }

    /// Read `key`
    ///
    /// Returns:
    /// - `Ok(Some(value))`: key present
    /// - `Ok(None)`: key (or the whole table) absent
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let txn = self.db()?.begin_read()?;
        let table = match txn.open_table(self.definition()) {
            Ok(table) => table,
            Err(redb::TableError::TableDoesNotExist(_)) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let value = table.get(key)?.map(|guard| guard.value().to_vec());
        Ok(value)
    }

    /// Delete `key`, returning whether it existed
    pub fn remove(&self, key: &[u8]) -> Result<bool> {
        self.write(|table| {
            let existed = table.remove(key)?.is_some();
            Ok(existed)
        })
    }

    /// Number of entries
    pub fn len(&self) -> Result<u64> {
        let txn = self.db()?.begin_read()?;
        match txn.open_table(self.definition()) {
            Ok(table) => Ok(table.len()?),
            Err(redb::TableError::TableDoesNotExist(_)) => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    // =========================================================================
    // Typed Access
    // =========================================================================

    /// Raw key, scalar value
    pub fn set_scalar_value<V: Scalar>(&self, key: &[u8], value: V) -> Result<()> {
        self.set(key, &value.pack())
    }

    /// Raw key, scalar value
    pub fn get_scalar_value<V: Scalar>(&self, key: &[u8]) -> Result<Option<V>> {
        self.get(key)?.map(|bytes| V::unpack(&bytes)).transpose()
    }

    /// Scalar key, raw value
    pub fn set_scalar_key<K: Scalar>(&self, key: K, value: &[u8]) -> Result<()> {
        self.set(&key.pack(), value)
    }

    /// Scalar key, raw value
    pub fn get_scalar_key<K: Scalar>(&self, key: K) -> Result<Option<Vec<u8>>> {
        self.get(&key.pack())
    }

    /// Scalar key and value
    pub fn set_scalar_pair<K: Scalar, V: Scalar>(&self, key: K, value: V) -> Result<()> {
        self.set(&key.pack(), &value.pack())
    }

    /// Scalar key and value
    pub fn get_scalar_pair<K: Scalar, V: Scalar>(&self, key: K) -> Result<Option<V>> {
        self.get_scalar_value(&key.pack())
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Release this handle's share of the database
    ///
    /// Safe to call repeatedly. Sibling tables and the database itself stay
    /// open as long as something else holds them.
    pub fn close(&mut self) {
        self.db = None;
    }

    pub fn is_closed(&self) -> bool {
        self.db.is_none()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    pub(crate) fn definition(&self) -> RawTable<'_> {
        RawTable::new(&self.name)
    }

    fn db(&self) -> Result<&Database> {
        self.db.as_deref().ok_or(StoreError::Closed)
    }

    /// Run `f` in a write transaction, committing only if it succeeds
    fn write<T>(
        &self,
        f: impl FnOnce(&mut Table<'_, &'static [u8], &'static [u8]>) -> Result<T>,
    ) -> Result<T> {
        let txn = self.db()?.begin_write()?;
        let out = {
            let mut table = txn.open_table(self.definition())?;
            f(&mut table)?
        };
        // Dropping an uncommitted transaction aborts it
        txn.commit()?;
        Ok(out)
    }
}
