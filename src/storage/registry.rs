//! Backend registry
//!
//! Maps backend tags (as they appear in configuration) to backend kinds.

use std::fmt;
use std::str::FromStr;

use crate::error::{Result, StoreError};

/// Concrete backends that can be constructed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// In-process memory, nothing persisted
    Volatile,

    /// Transactional embedded database on disk
    Persistent,
}

/// Registered tags and the backend each one selects
const REGISTRY: &[(&str, BackendKind)] = &[
    ("volatile", BackendKind::Volatile),
    ("memory", BackendKind::Volatile),
    ("mem", BackendKind::Volatile),
    ("persistent", BackendKind::Persistent),
    ("redb", BackendKind::Persistent),
    ("disk", BackendKind::Persistent),
    ("lmdb", BackendKind::Persistent),
];

/// Tags naming the abstract contract itself
const ABSTRACT_TAGS: &[&str] = &["base", "abstract"];

/// Resolve a backend tag (case-insensitive)
pub fn lookup(name: &str) -> Result<BackendKind> {
    let name = name.trim().to_ascii_lowercase();

    if let Some((_, kind)) = REGISTRY.iter().find(|(tag, _)| *tag == name) {
        return Ok(*kind);
    }

    if ABSTRACT_TAGS.contains(&name.as_str()) {
        return Err(StoreError::NotInstantiable(name));
    }

    Err(StoreError::Config(format!(
        "unknown backend '{}', expected one of: {}",
        name,
        names().collect::<Vec<_>>().join(", ")
    )))
}

/// Every registered tag
pub fn names() -> impl Iterator<Item = &'static str> {
    REGISTRY.iter().map(|(tag, _)| *tag)
}

impl BackendKind {
    /// Canonical tag
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Volatile => "volatile",
            BackendKind::Persistent => "persistent",
        }
    }
}

impl FromStr for BackendKind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        lookup(s)
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
