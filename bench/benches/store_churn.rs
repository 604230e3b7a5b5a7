//! Churn scenario benchmarks using Criterion.
//!
//! These benchmarks measure a population that turns over every frame, and the cost of
//! compacting a table full of tombstones.

use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use rusty_bench::churn::{ChurnConfig, ChurnScenario};
use rusty_bench::components::{Name, Position};
use rusty_store::ecs::entity::Id;
use rusty_store::ecs::storage::Storage;

fn bench_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenario/churn");

    for count in [1_000, 10_000, 50_000] {
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::new("frame", count), &count, |b, &n| {
            let mut scenario = ChurnScenario::with_config(ChurnConfig {
                entity_count: n,
                ..Default::default()
            })
            .unwrap();
            scenario.setup().unwrap();

            b.iter(|| {
                scenario.update().unwrap();
            });
        });
    }

    group.finish();
}

fn bench_collect_garbage(c: &mut Criterion) {
    let mut group = c.benchmark_group("collect_garbage");
    let registry = rusty_bench::registry().unwrap();

    for count in [1_000, 10_000, 50_000] {
        group.throughput(Throughput::Elements(count as u64));

        // Half the table tombstoned
        group.bench_with_input(BenchmarkId::new("half_removed", count), &count, |b, &n| {
            b.iter_batched(
                || {
                    let mut storage = Storage::new(registry.clone());
                    for i in 0..n {
                        let handle = storage.add_entity(Id::new(i as u64 + 1)).unwrap();
                        storage.add(handle, Position::default()).unwrap();
                        storage.add(handle, Name(format!("entity {i}"))).unwrap();
                        if i % 2 == 0 {
                            storage.remove_entity(handle).unwrap();
                        }
                    }
                    storage
                },
                |mut storage| {
                    storage.collect_garbage();
                    storage
                },
                BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

criterion_group!(benches, bench_churn, bench_collect_garbage);
criterion_main!(benches);
