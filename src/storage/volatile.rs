//! Volatile backend
//!
//! Keeps every batch in process memory. Nothing survives the process.

use std::iter::Zip;
use std::slice::Iter;

use tracing::debug;

use crate::batch::{Batch, CodeBlock, IdentifierSet};
use crate::error::Result;

use super::{Batches, CodeStorage};

/// In-memory code storage
///
/// Two parallel vectors hold identifier sets and code blocks; index `i` of
/// each belongs to batch `i`.
#[derive(Debug, Default)]
pub struct VolatileStorage {
    /// Code blocks in insertion order
    blocks: Vec<CodeBlock>,

    /// Identifier sets in insertion order
    keys: Vec<IdentifierSet>,

    num_items: u64,
    num_emptys: u64,
}

impl VolatileStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrowing iterator over stored batches, without cloning
    pub fn iter(&self) -> VolatileBatches<'_> {
        VolatileBatches {
            inner: self.keys.iter().zip(self.blocks.iter()),
        }
    }

    /// Nothing to release; present for symmetry with the persistent backend
    pub fn close(&mut self) {}
}

impl CodeStorage for VolatileStorage {
    fn add(&mut self, identifiers: IdentifierSet, codes: CodeBlock) -> Result<()> {
        let (identifiers, codes) = Batch::new(identifiers, codes)?.into_parts();
        let rows = codes.rows() as u64;

        self.keys.push(identifiers);
        self.blocks.push(codes);
        self.num_items += rows;
        if rows == 0 {
            self.num_emptys += 1;
        }

        debug!(batch = self.blocks.len() - 1, rows, "batch added");
        Ok(())
    }

    fn num_items(&self) -> u64 {
        self.num_items
    }

    fn num_emptys(&self) -> Option<u64> {
        Some(self.num_emptys)
    }

    fn num_batches(&self) -> u64 {
        self.blocks.len() as u64
    }

    fn clear(&mut self) -> Result<()> {
        self.blocks.clear();
        self.keys.clear();
        self.num_items = 0;
        self.num_emptys = 0;
        Ok(())
    }

    fn batches(&self) -> Result<Batches<'_>> {
        Ok(Box::new(self.iter().map(|(identifiers, codes)| {
            Ok(Batch {
                identifiers: identifiers.clone(),
                codes: codes.clone(),
            })
        })))
    }
}

/// Iterator over borrowed (identifiers, codes) pairs
pub struct VolatileBatches<'a> {
    inner: Zip<Iter<'a, IdentifierSet>, Iter<'a, CodeBlock>>,
}

impl<'a> Iterator for VolatileBatches<'a> {
    type Item = (&'a IdentifierSet, &'a CodeBlock);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}
