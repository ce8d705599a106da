//! Transactional environment
//!
//! Owns the embedded database file and hands out table handles.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use redb::Database;
use tracing::debug;

use crate::error::{Result, StoreError};

use super::{KvTable, RawTable};

/// A shared handle to one embedded database
///
/// Cloning is cheap; the database closes when the last clone (including
/// the ones held by open tables) is dropped.
#[derive(Clone)]
pub struct Environment {
    db: Arc<Database>,
    file: PathBuf,
}

impl Environment {
    /// Database file name inside the root directory
    pub const FILENAME: &'static str = "codes.redb";

    /// Open or create the environment under `dir`
    pub fn open(dir: &Path, cache_size: Option<usize>) -> Result<Self> {
        fs::create_dir_all(dir).map_err(|e| {
            StoreError::BackendUnavailable(format!("create {}: {}", dir.display(), e))
        })?;

        let file = dir.join(Self::FILENAME);

        let mut builder = Database::builder();
        if let Some(cache_size) = cache_size {
            builder.set_cache_size(cache_size);
        }

        let db = builder.create(&file).map_err(|e| {
            StoreError::BackendUnavailable(format!("open {}: {}", file.display(), e))
        })?;

        debug!(path = %file.display(), "environment opened");

        Ok(Self {
            db: Arc::new(db),
            file,
        })
    }

    /// Open `name`, creating it if it does not exist yet
    pub fn table(&self, name: &str) -> Result<KvTable> {
        let unavailable = |e: &dyn std::fmt::Display| {
            StoreError::BackendUnavailable(format!("table {}: {}", name, e))
        };

        let txn = self.db.begin_write().map_err(|e| unavailable(&e))?;
        txn.open_table(RawTable::new(name)).map_err(|e| unavailable(&e))?;
        txn.commit().map_err(|e| unavailable(&e))?;

        Ok(KvTable::new(name, Arc::clone(&self.db)))
    }

    /// The underlying database
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Path of the database file
    pub fn file_path(&self) -> &Path {
        &self.file
    }

    /// Current size of the database file in bytes
    pub fn file_size(&self) -> Result<u64> {
        Ok(fs::metadata(&self.file)?.len())
    }
}
