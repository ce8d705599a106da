//! Benchmarks for pqstore storage operations

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use pqstore::{
    CodeBlock, CodeStorage, IdentifierSet, PersistentOptions, PersistentStorage, VolatileStorage,
};
use tempfile::TempDir;

const ROWS: usize = 256;
const COLS: usize = 16;

fn make_batch(offset: i64) -> (IdentifierSet, CodeBlock) {
    let ids: IdentifierSet = (0..ROWS as i64).map(|i| offset + i).collect();
    let codes = (0..ROWS * COLS).map(|i| (i % 256) as u8).collect::<Vec<_>>();
    (ids, CodeBlock::new(ROWS, COLS, codes).unwrap())
}

fn volatile_benchmarks(c: &mut Criterion) {
    c.bench_function("volatile_add", |b| {
        let mut storage = VolatileStorage::new();
        b.iter_batched(
            || make_batch(0),
            |(ids, codes)| storage.add(ids, codes).unwrap(),
            BatchSize::SmallInput,
        );
    });

    let mut storage = VolatileStorage::new();
    for i in 0..100 {
        let (ids, codes) = make_batch(i * ROWS as i64);
        storage.add(ids, codes).unwrap();
    }
    c.bench_function("volatile_iterate_100", |b| {
        b.iter(|| storage.batches().unwrap().count());
    });
}

fn persistent_benchmarks(c: &mut Criterion) {
    let temp = TempDir::new().unwrap();

    c.bench_function("persistent_add", |b| {
        let options = PersistentOptions::new(temp.path().join("add")).clear_on_open(true);
        let mut storage = PersistentStorage::open(options).unwrap();
        b.iter_batched(
            || make_batch(0),
            |(ids, codes)| storage.add(ids, codes).unwrap(),
            BatchSize::SmallInput,
        );
    });

    let mut storage = PersistentStorage::open_path(&temp.path().join("iterate")).unwrap();
    for i in 0..100 {
        let (ids, codes) = make_batch(i * ROWS as i64);
        storage.add(ids, codes).unwrap();
    }
    c.bench_function("persistent_iterate_100", |b| {
        b.iter(|| storage.batches().unwrap().count());
    });
}

criterion_group!(benches, volatile_benchmarks, persistent_benchmarks);
criterion_main!(benches);
