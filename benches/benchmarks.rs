//! Performance benchmarks for the announce registry
//!
//! Run with: cargo bench

use std::sync::Arc;

use chrono::Duration;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use dht_hook::hook::{AnnounceRegistry, Clock, ManualClock};

fn hash(i: u32) -> dht_hook::hook::InfoHash {
    let mut bytes = [0u8; 20];
    bytes[..4].copy_from_slice(&i.to_be_bytes());
    bytes.into()
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
}

/// Recording fresh and already known hashes
fn bench_record(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("announce_record");

    for size in [1_000u32, 10_000, 100_000].iter() {
        let clock = Arc::new(ManualClock::default());
        let registry = AnnounceRegistry::new(*size as usize, clock.clone());
        rt.block_on(async {
            for i in 0..*size {
                registry.record(hash(i)).await.unwrap();
            }
        });

        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::new("refresh", size), size, |b, size| {
            let mut i = 0u32;
            b.iter(|| {
                i = (i + 1) % size;
                rt.block_on(registry.record(black_box(hash(i)))).unwrap();
            })
        });
    }

    group.finish();
}

/// Collecting a batch for one remote
fn bench_collect_since(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("announce_collect_since");

    for size in [1_000u32, 10_000, 100_000].iter() {
        let clock = Arc::new(ManualClock::default());
        let registry = AnnounceRegistry::new(*size as usize, clock.clone());
        let start = clock.now();
        rt.block_on(async {
            for i in 0..*size {
                if i % 2 == 0 {
                    clock.advance(Duration::milliseconds(1));
                }
                registry.record(hash(i)).await.unwrap();
            }
        });
        // half of the hashes are seen after this
        let threshold = start + Duration::milliseconds(*size as i64 / 4);

        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::new("collect", size), &threshold, |b, threshold| {
            b.iter(|| rt.block_on(registry.collect_since(black_box(*threshold))))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_record, bench_collect_since);
criterion_main!(benches);
