//! Benchmarks for entry store operations

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use nettable_core::{KindMask, Value};
use nettable_store::{Dispatcher, EntryStore};

fn store() -> EntryStore {
    EntryStore::new(Arc::new(Dispatcher::new(4096).unwrap()))
}

fn bench_set(c: &mut Criterion) {
    let store = store();

    c.bench_function("store_set", |b| {
        b.iter(|| {
            store.set(black_box("/bench/x"), black_box(Value::Double(1.0)), None);
        })
    });
}

fn bench_get(c: &mut Criterion) {
    let store = store();
    store.set("/bench/x", Value::Double(1.0), None);

    c.bench_function("store_get", |b| {
        b.iter(|| black_box(store.get(black_box("/bench/x"))))
    });
}

fn bench_stale_update(c: &mut Criterion) {
    let store = store();
    store.apply_update("/bench/x", Value::Double(1.0), 1_000_000);

    c.bench_function("store_stale_update", |b| {
        b.iter(|| {
            store.apply_update(black_box("/bench/x"), black_box(Value::Double(2.0)), 1);
        })
    });
}

fn bench_enumerate(c: &mut Criterion) {
    let store = store();
    for i in 0..100 {
        store.set(&format!("/bench/{i}"), Value::Double(i as f64), None);
    }

    c.bench_function("store_enumerate_100", |b| {
        b.iter(|| black_box(store.get_entry_info(black_box("/bench/"), KindMask::ANY)))
    });
}

criterion_group!(
    benches,
    bench_set,
    bench_get,
    bench_stale_update,
    bench_enumerate
);
criterion_main!(benches);
