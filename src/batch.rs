//! Batch data model
//!
//! A batch is one `add` call's worth of data: an ordered identifier set and a
//! row-major code block with one row per identifier.
//!
//! ## Layout
//! ```text
//!  identifiers        codes (rows x cols)
//! ┌──────────┐      ┌────┬────┬────┬────┐
//! │ id[0]    │ ───▶ │ c00│ c01│ ...│ c0m│
//! │ id[1]    │ ───▶ │ c10│ c11│ ...│ c1m│
//! │ ...      │      │ ...│    │    │    │
//! └──────────┘      └────┴────┴────┴────┘
//! ```
//!
//! All batches in one storage instance are expected to share the same column
//! count and element type. That is a caller precondition; storage does not
//! enforce it.

use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

// =============================================================================
// Identifiers
// =============================================================================

/// Opaque item identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemId {
    Int(i64),
    Text(String),
    Bytes(Vec<u8>),
}

impl From<i64> for ItemId {
    fn from(value: i64) -> Self {
        ItemId::Int(value)
    }
}

impl From<u32> for ItemId {
    fn from(value: u32) -> Self {
        ItemId::Int(i64::from(value))
    }
}

impl From<String> for ItemId {
    fn from(value: String) -> Self {
        ItemId::Text(value)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        ItemId::Text(value.to_string())
    }
}

impl From<Vec<u8>> for ItemId {
    fn from(value: Vec<u8>) -> Self {
        ItemId::Bytes(value)
    }
}

/// Ordered identifiers for the rows of one code block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentifierSet(Vec<ItemId>);

impl IdentifierSet {
    pub fn new(ids: Vec<ItemId>) -> Self {
        Self(ids)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ItemId> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[ItemId] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<ItemId> {
        self.0
    }
}

impl<T: Into<ItemId>> From<Vec<T>> for IdentifierSet {
    fn from(ids: Vec<T>) -> Self {
        ids.into_iter().collect()
    }
}

impl<T: Into<ItemId>> FromIterator<T> for IdentifierSet {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<'a> IntoIterator for &'a IdentifierSet {
    type Item = &'a ItemId;
    type IntoIter = std::slice::Iter<'a, ItemId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// =============================================================================
// Code Blocks
// =============================================================================

/// Element encoding of a code block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ElementType {
    U8 = 1,
    U16 = 2,
    U32 = 3,
    I32 = 4,
    F32 = 5,
    F64 = 6,
}

impl ElementType {
    /// Width of one element in bytes
    pub fn width(self) -> usize {
        match self {
            ElementType::U8 => 1,
            ElementType::U16 => 2,
            ElementType::U32 | ElementType::I32 | ElementType::F32 => 4,
            ElementType::F64 => 8,
        }
    }

    /// Parse an on-disk element tag
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(ElementType::U8),
            2 => Some(ElementType::U16),
            3 => Some(ElementType::U32),
            4 => Some(ElementType::I32),
            5 => Some(ElementType::F32),
            6 => Some(ElementType::F64),
            _ => None,
        }
    }
}

/// Row-major element storage of a code block
#[derive(Debug, Clone, PartialEq)]
pub enum CodeData {
    U8(Vec<u8>),
    U16(Vec<u16>),
    U32(Vec<u32>),
    I32(Vec<i32>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

impl CodeData {
    pub fn element_type(&self) -> ElementType {
        match self {
            CodeData::U8(_) => ElementType::U8,
            CodeData::U16(_) => ElementType::U16,
            CodeData::U32(_) => ElementType::U32,
            CodeData::I32(_) => ElementType::I32,
            CodeData::F32(_) => ElementType::F32,
            CodeData::F64(_) => ElementType::F64,
        }
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        match self {
            CodeData::U8(v) => v.len(),
            CodeData::U16(v) => v.len(),
            CodeData::U32(v) => v.len(),
            CodeData::I32(v) => v.len(),
            CodeData::F32(v) => v.len(),
            CodeData::F64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

macro_rules! code_data_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<Vec<$ty>> for CodeData {
                fn from(values: Vec<$ty>) -> Self {
                    CodeData::$variant(values)
                }
            }
        )*
    };
}

code_data_from!(
    u8 => U8,
    u16 => U16,
    u32 => U32,
    i32 => I32,
    f32 => F32,
    f64 => F64,
);

/// A 2-D matrix of quantization codes, one row per item
#[derive(Debug, Clone, PartialEq)]
pub struct CodeBlock {
    rows: usize,
    cols: usize,
    data: CodeData,
}

impl CodeBlock {
    /// Build a block, checking that `data` holds exactly `rows * cols` elements
    pub fn new(rows: usize, cols: usize, data: impl Into<CodeData>) -> Result<Self> {
        let data = data.into();
        let expected = rows.checked_mul(cols).ok_or_else(|| {
            StoreError::InvalidBlock(format!("{} x {} overflows usize", rows, cols))
        })?;

        if data.len() != expected {
            return Err(StoreError::InvalidBlock(format!(
                "expected {} elements for {} x {}, got {}",
                expected,
                rows,
                cols,
                data.len()
            )));
        }

        Ok(Self { rows, cols, data })
    }

    /// A block with zero rows
    pub fn empty(cols: usize, element: ElementType) -> Self {
        let data = match element {
            ElementType::U8 => CodeData::U8(Vec::new()),
            ElementType::U16 => CodeData::U16(Vec::new()),
            ElementType::U32 => CodeData::U32(Vec::new()),
            ElementType::I32 => CodeData::I32(Vec::new()),
            ElementType::F32 => CodeData::F32(Vec::new()),
            ElementType::F64 => CodeData::F64(Vec::new()),
        };
        Self { rows: 0, cols, data }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn element_type(&self) -> ElementType {
        self.data.element_type()
    }

    pub fn data(&self) -> &CodeData {
        &self.data
    }

    pub fn into_data(self) -> CodeData {
        self.data
    }
}

// =============================================================================
// Batch
// =============================================================================

/// One stored (identifiers, codes) pair
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub identifiers: IdentifierSet,
    pub codes: CodeBlock,
}

impl Batch {
    /// Pair identifiers with codes, rejecting a count mismatch
    pub fn new(identifiers: IdentifierSet, codes: CodeBlock) -> Result<Self> {
        if identifiers.len() != codes.rows() {
            return Err(StoreError::InvalidBatch {
                identifiers: identifiers.len(),
                rows: codes.rows(),
            });
        }
        Ok(Self { identifiers, codes })
    }

    /// Number of items in this batch
    pub fn rows(&self) -> usize {
        self.codes.rows()
    }

    pub fn into_parts(self) -> (IdentifierSet, CodeBlock) {
        (self.identifiers, self.codes)
    }
}
