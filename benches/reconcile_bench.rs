//! Reconciliation benchmarks over generated directories.
//!
//! Each directory is a company of `size` people where roughly a third have
//! assistants. The target is the baseline with some people renamed, some
//! removed, some hired and some assistants reassigned.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use directory_diff::Options;
use directory_diff::Record;
use directory_diff::reconcile;

fn email(person: usize) -> String {
    return format!("person{}@envoy.com", person);
}

fn person(rng: &mut StdRng, id: usize, population: usize) -> Record {
    let mut record = Record::new(format!("Person {}", id), &email(id))
        .with_phone(format!("415-{:03}-{:04}", rng.gen_range(0..1000), rng.gen_range(0..10000)));
    if rng.gen_bool(0.33) {
        let count = rng.gen_range(1..=2);
        let assistants: Vec<String> = (0..count).map(|_| email(rng.gen_range(0..population))).collect();
        record = record.with_assistants(&assistants.join(","));
    }
    return record;
}

fn make_directories(size: usize, seed: u64) -> (Vec<Record>, Vec<Record>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let baseline: Vec<Record> = (0..size).map(|id| person(&mut rng, id, size)).collect();

    let mut target = Vec::with_capacity(size);
    for record in &baseline {
        let roll = rng.gen_range(0..100);
        if roll < 5 {
            continue;
        }
        let mut record = record.clone();
        if roll < 15 {
            if let Some(name) = record.name.as_mut() {
                name.push_str(" Jr.");
            }
        } else if roll < 20 {
            record = record.with_assistants(&email(rng.gen_range(0..size)));
        }
        target.push(record);
    }
    for id in size..size + size / 20 {
        target.push(person(&mut rng, id, size + size / 20));
    }
    return (baseline, target);
}

fn bench_reconcile(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile");

    for size in [100, 1_000, 10_000] {
        let (baseline, target) = make_directories(size, 42);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("in_memory", size), &(baseline, target), |b, (baseline, target)| {
            b.iter(|| {
                let ops = reconcile(baseline.clone())
                    .into(target.clone(), &Options::default())
                    .unwrap();
                black_box(ops.len())
            });
        });
    }

    group.finish();
}

fn bench_reference_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("reference_chain");

    // Everyone is the next person's assistant: one long dependency chain.
    for size in [1_000, 100_000] {
        let target: Vec<Record> = (0..size)
            .map(|id| Record::new(format!("Person {}", id), &email(id)).with_assistants(&email(id + 1)))
            .collect();
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("in_memory", size), &target, |b, target| {
            b.iter(|| {
                let ops = reconcile(Vec::new()).into(target.clone(), &Options::default()).unwrap();
                black_box(ops.len())
            });
        });
    }

    group.finish();
}

// =============================================================================
// Criterion Configuration
// =============================================================================

criterion_group!(benches, bench_reconcile, bench_reference_chain);

criterion_main!(benches);
