//! Criterion micro-benchmarks for registry checkpoints.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use tempo_bench::wide_registry;
use tempo_migrate::{fnv1a, registry_from_bytes, registry_to_bytes, ChooserTypes, UnknownTypePolicy};

/// Benchmark: checkpoint a 64-chooser registry.
fn bench_snapshot_registry(c: &mut Criterion) {
    let registry = wide_registry(64, 42);

    c.bench_function("snapshot_registry_64", |b| {
        b.iter(|| {
            black_box(registry_to_bytes(&registry).unwrap());
        });
    });
}

/// Benchmark: restore the same checkpoint with the builtin type table.
fn bench_restore_registry(c: &mut Criterion) {
    let bytes = registry_to_bytes(&wide_registry(64, 42)).unwrap();
    let types = ChooserTypes::builtin();

    c.bench_function("restore_registry_64", |b| {
        b.iter(|| {
            let (registry, _) =
                registry_from_bytes(black_box(&bytes), &types, UnknownTypePolicy::Abort).unwrap();
            black_box(registry);
        });
    });
}

/// Benchmark: checksum over 64 KiB.
fn bench_fnv1a_64k(c: &mut Criterion) {
    let data: Vec<u8> = (0..65_536u32).map(|i| (i % 251) as u8).collect();

    c.bench_function("fnv1a_64k", |b| {
        b.iter(|| {
            black_box(fnv1a(black_box(&data)));
        });
    });
}

criterion_group!(
    benches,
    bench_snapshot_registry,
    bench_restore_registry,
    bench_fnv1a_64k
);
criterion_main!(benches);
