//! Tests for the volatile backend
//!
//! These tests verify:
//! - Batches come back in insertion order, unchanged
//! - Item and empty-batch counters track every add
//! - Clear resets everything
//! - Mismatched batches are rejected without side effects

use pqstore::{CodeBlock, CodeStorage, IdentifierSet, StoreError, VolatileStorage};

// =============================================================================
// Helper Functions
// =============================================================================

fn make_batch(first_id: i64, rows: usize, cols: usize) -> (IdentifierSet, CodeBlock) {
    let ids: IdentifierSet = (0..rows as i64).map(|i| first_id + i).collect();
    let codes = (0..rows * cols)
        .map(|i| (first_id as usize + i) as u8)
        .collect::<Vec<u8>>();
    (ids, CodeBlock::new(rows, cols, codes).unwrap())
}

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_new_storage_is_empty() {
    let storage = VolatileStorage::new();

    assert_eq!(storage.num_items(), 0);
    assert_eq!(storage.num_batches(), 0);
    assert_eq!(storage.num_emptys(), Some(0));
    assert!(storage.is_empty());
    assert_eq!(storage.batches().unwrap().count(), 0);
}

#[test]
fn test_add_and_iterate_in_order() {
    let mut storage = VolatileStorage::new();
    let batches = vec![make_batch(0, 2, 4), make_batch(10, 5, 4), make_batch(20, 1, 4)];

    for (ids, codes) in batches.clone() {
        storage.add(ids, codes).unwrap();
    }

    let stored: Vec<_> = storage
        .batches()
        .unwrap()
        .map(|batch| batch.unwrap().into_parts())
        .collect();

    assert_eq!(stored, batches);
    assert_eq!(storage.num_items(), 8);
    assert_eq!(storage.num_batches(), 3);
}

#[test]
fn test_borrowing_iter_matches_batches() {
    let mut storage = VolatileStorage::new();
    let (ids, codes) = make_batch(3, 3, 2);
    storage.add(ids.clone(), codes.clone()).unwrap();

    let mut iter = storage.iter();
    assert_eq!(iter.size_hint(), (1, Some(1)));
    assert_eq!(iter.next(), Some((&ids, &codes)));
    assert_eq!(iter.next(), None);
}

#[test]
fn test_iteration_restarts_from_first_batch() {
    let mut storage = VolatileStorage::new();
    for i in 0..4 {
        let (ids, codes) = make_batch(i * 10, 2, 2);
        storage.add(ids, codes).unwrap();
    }

    let mut partial = storage.batches().unwrap();
    partial.next().unwrap().unwrap();
    partial.next().unwrap().unwrap();

    let first_pass: Vec<_> = storage.batches().unwrap().map(|b| b.unwrap()).collect();
    let second_pass: Vec<_> = storage.batches().unwrap().map(|b| b.unwrap()).collect();

    assert_eq!(first_pass.len(), 4);
    assert_eq!(first_pass, second_pass);
}

#[test]
fn test_empty_batch_counted() {
    let mut storage = VolatileStorage::new();

    let (ids, codes) = make_batch(0, 0, 4);
    storage.add(ids, codes).unwrap();
    let (ids, codes) = make_batch(0, 3, 4);
    storage.add(ids, codes).unwrap();

    assert_eq!(storage.num_items(), 3);
    assert_eq!(storage.num_emptys(), Some(1));
    assert_eq!(storage.num_batches(), 2);
}

// =============================================================================
// Validation Tests
// =============================================================================

#[test]
fn test_mismatched_batch_rejected() {
    let mut storage = VolatileStorage::new();
    let ids: IdentifierSet = vec![1i64, 2, 3].into();
    let codes = CodeBlock::new(2, 2, vec![0u8; 4]).unwrap();

    let result = storage.add(ids, codes);

    assert!(matches!(
        result,
        Err(StoreError::InvalidBatch {
            identifiers: 3,
            rows: 2
        })
    ));
    assert_eq!(storage.num_items(), 0);
    assert!(storage.is_empty());
}

// =============================================================================
// Clear Tests
// =============================================================================

#[test]
fn test_clear_resets() {
    let mut storage = VolatileStorage::new();
    for i in 0..3 {
        let (ids, codes) = make_batch(i, 2, 2);
        storage.add(ids, codes).unwrap();
    }

    storage.clear().unwrap();

    assert_eq!(storage.num_items(), 0);
    assert_eq!(storage.num_emptys(), Some(0));
    assert_eq!(storage.batches().unwrap().count(), 0);

    storage.clear().unwrap();
    assert_eq!(storage.num_items(), 0);
}
