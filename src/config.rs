//! Configuration for pqstore
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::codec::sequence::DEFAULT_KEY_DIGITS;
use crate::storage::BackendKind;

/// Main configuration for a storage instance
#[derive(Debug, Clone)]
pub struct StorageConfig {
    // -------------------------------------------------------------------------
    // Backend Selection
    // -------------------------------------------------------------------------
    /// Which backend to construct
    pub backend: BackendKind,

    // -------------------------------------------------------------------------
    // Persistent Backend Configuration
    // -------------------------------------------------------------------------
    /// Root directory for the persistent environment
    /// Internal structure:
    ///   {path}/
    ///     └── codes.redb       (keys, vals and info tables)
    pub path: PathBuf,

    /// Drop every stored batch right after opening
    pub clear_on_open: bool,

    /// Upper bound on the database file size (in bytes)
    pub max_size: u64,

    /// Digits in the zero-padded sequence key
    pub key_digits: usize,

    /// Page cache size handed to the engine (in bytes), engine default if unset
    pub cache_size: Option<usize>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Volatile,
            path: PathBuf::from("./pqstore_data"),
            clear_on_open: false,
            max_size: 1 << 30, // 1 GB
            key_digits: DEFAULT_KEY_DIGITS,
            cache_size: None,
        }
    }
}

impl StorageConfig {
    /// Create a new config builder
    pub fn builder() -> StorageConfigBuilder {
        StorageConfigBuilder::default()
    }

    /// Options for the persistent backend derived from this config
    pub fn persistent_options(&self) -> PersistentOptions {
        PersistentOptions {
            path: self.path.clone(),
            clear_on_open: self.clear_on_open,
            max_size: self.max_size,
            key_digits: self.key_digits,
            cache_size: self.cache_size,
        }
    }
}

/// Builder for StorageConfig
#[derive(Default)]
pub struct StorageConfigBuilder {
    config: StorageConfig,
}

impl StorageConfigBuilder {
    /// Select the backend
    pub fn backend(mut self, backend: BackendKind) -> Self {
        self.config.backend = backend;
        self
    }

    /// Shorthand for a volatile backend
    pub fn volatile(self) -> Self {
        self.backend(BackendKind::Volatile)
    }

    /// Shorthand for a persistent backend rooted at `path`
    pub fn persistent(self, path: impl Into<PathBuf>) -> Self {
        self.backend(BackendKind::Persistent).path(path)
    }

    /// Set the persistent root directory
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.path = path.into();
        self
    }

    /// Clear all data when the persistent backend opens
    pub fn clear_on_open(mut self, clear: bool) -> Self {
        self.config.clear_on_open = clear;
        self
    }

    /// Set the maximum database size (in bytes)
    pub fn max_size(mut self, size: u64) -> Self {
        self.config.max_size = size;
        self
    }

    /// Set the sequence key width (in decimal digits)
    pub fn key_digits(mut self, digits: usize) -> Self {
        self.config.key_digits = digits;
        self
    }

    /// Set the engine cache size (in bytes)
    pub fn cache_size(mut self, size: usize) -> Self {
        self.config.cache_size = Some(size);
        self
    }

    pub fn build(self) -> StorageConfig {
        self.config
    }
}

/// Settings consumed by `PersistentStorage::open`
#[derive(Debug, Clone)]
pub struct PersistentOptions {
    pub path: PathBuf,
    pub clear_on_open: bool,
    pub max_size: u64,
    pub key_digits: usize,
    pub cache_size: Option<usize>,
}

impl PersistentOptions {
    /// Options for `path` with every other field at its default
    pub fn new(path: impl Into<PathBuf>) -> Self {
        StorageConfig::builder().persistent(path).build().persistent_options()
    }

    pub fn clear_on_open(mut self, clear: bool) -> Self {
        self.clear_on_open = clear;
        self
    }

    pub fn max_size(mut self, size: u64) -> Self {
        self.max_size = size;
        self
    }

    pub fn key_digits(mut self, digits: usize) -> Self {
        self.key_digits = digits;
        self
    }
}
