//! Tests for the KV table handle
//!
//! These tests verify:
//! - Raw get/set/remove with an explicit absent result
//! - Typed scalar wrappers on the key side, value side and both
//! - Table isolation inside one environment
//! - Idempotent close that leaves sibling tables usable

use pqstore::kv::Environment;
use pqstore::StoreError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_env() -> (TempDir, Environment) {
    let temp_dir = TempDir::new().unwrap();
    let env = Environment::open(temp_dir.path(), None).unwrap();
    (temp_dir, env)
}

// =============================================================================
// Raw Access Tests
// =============================================================================

#[test]
fn test_environment_creates_database_file() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("nested").join("store");

    let env = Environment::open(&root, None).unwrap();

    assert!(root.join(Environment::FILENAME).exists());
    assert_eq!(env.file_path(), root.join(Environment::FILENAME));
    assert!(env.file_size().unwrap() > 0);
}

#[test]
fn test_set_get() {
    let (_temp, env) = setup_temp_env();
    let table = env.table("info").unwrap();

    table.set(b"hello", b"world").unwrap();

    assert_eq!(table.get(b"hello").unwrap(), Some(b"world".to_vec()));
}

#[test]
fn test_get_absent_key() {
    let (_temp, env) = setup_temp_env();
    let table = env.table("info").unwrap();

    assert_eq!(table.get(b"missing").unwrap(), None);
}

#[test]
fn test_set_overwrites() {
    let (_temp, env) = setup_temp_env();
    let table = env.table("info").unwrap();

    table.set(b"key", b"value1").unwrap();
    table.set(b"key", b"value2").unwrap();

    assert_eq!(table.get(b"key").unwrap(), Some(b"value2".to_vec()));
    assert_eq!(table.len().unwrap(), 1);
}

#[test]
fn test_empty_value_is_not_absent() {
    let (_temp, env) = setup_temp_env();
    let table = env.table("info").unwrap();

    table.set(b"key", b"").unwrap();

    assert_eq!(table.get(b"key").unwrap(), Some(Vec::new()));
}

#[test]
fn test_remove() {
    let (_temp, env) = setup_temp_env();
    let table = env.table("info").unwrap();

    table.set(b"key", b"value").unwrap();

    assert!(table.remove(b"key").unwrap());
    assert!(!table.remove(b"key").unwrap());
    assert_eq!(table.get(b"key").unwrap(), None);
    assert!(table.is_empty().unwrap());
}

#[test]
fn test_tables_are_isolated() {
    let (_temp, env) = setup_temp_env();
    let keys = env.table("keys").unwrap();
    let vals = env.table("vals").unwrap();

    keys.set(b"00000000", b"ids").unwrap();

    assert_eq!(vals.get(b"00000000").unwrap(), None);
    assert_eq!(keys.len().unwrap(), 1);
    assert_eq!(vals.len().unwrap(), 0);
}

// =============================================================================
// Typed Access Tests
// =============================================================================

#[test]
fn test_scalar_value() {
    let (_temp, env) = setup_temp_env();
    let table = env.table("info").unwrap();

    table.set_scalar_value(b"num_items", 12345i32).unwrap();

    assert_eq!(table.get_scalar_value::<i32>(b"num_items").unwrap(), Some(12345));
    assert_eq!(
        table.get(b"num_items").unwrap(),
        Some(12345i32.to_ne_bytes().to_vec())
    );
    assert_eq!(table.get_scalar_value::<i32>(b"absent").unwrap(), None);
}

#[test]
fn test_scalar_key() {
    let (_temp, env) = setup_temp_env();
    let table = env.table("info").unwrap();

    table.set_scalar_key(7i32, b"seven").unwrap();

    assert_eq!(table.get_scalar_key(7i32).unwrap(), Some(b"seven".to_vec()));
    assert_eq!(table.get(&7i32.to_ne_bytes()).unwrap(), Some(b"seven".to_vec()));
    assert_eq!(table.get_scalar_key(8i32).unwrap(), None);
}

#[test]
fn test_scalar_pair() {
    let (_temp, env) = setup_temp_env();
    let table = env.table("info").unwrap();

    table.set_scalar_pair(1i32, -99i32).unwrap();

    assert_eq!(table.get_scalar_pair::<i32, i32>(1).unwrap(), Some(-99));
    assert_eq!(table.get_scalar_pair::<i32, i32>(2).unwrap(), None);
}

#[test]
fn test_scalar_value_wrong_width() {
    let (_temp, env) = setup_temp_env();
    let table = env.table("info").unwrap();

    table.set(b"num_items", b"abc").unwrap();

    let result = table.get_scalar_value::<i32>(b"num_items");
    assert!(matches!(result, Err(StoreError::Serialization(_))));
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_close_is_idempotent() {
    let (_temp, env) = setup_temp_env();
    let mut table = env.table("info").unwrap();

    table.close();
    table.close();

    assert!(table.is_closed());
    assert!(matches!(table.get(b"key"), Err(StoreError::Closed)));
    assert!(matches!(table.set(b"key", b"v"), Err(StoreError::Closed)));
}

#[test]
fn test_close_leaves_siblings_open() {
    let (_temp, env) = setup_temp_env();
    let mut keys = env.table("keys").unwrap();
    let vals = env.table("vals").unwrap();

    keys.close();
    vals.set(b"k", b"v").unwrap();

    assert_eq!(vals.get(b"k").unwrap(), Some(b"v".to_vec()));
    assert_eq!(vals.name(), "vals");
}

#[test]
fn test_data_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();

    {
        let env = Environment::open(temp_dir.path(), None).unwrap();
        let table = env.table("info").unwrap();
        table.set_scalar_value(b"num_items", 8i32).unwrap();
    }

    let env = Environment::open(temp_dir.path(), None).unwrap();
    let table = env.table("info").unwrap();
    assert_eq!(table.get_scalar_value::<i32>(b"num_items").unwrap(), Some(8));
}
