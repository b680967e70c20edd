use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dedupe::classify::{Candidate, ClassificationResult};
use dedupe::cluster::{ids, Cluster, RefineCluster, TransitiveClosure};
use rand::prelude::*;

/// Records fall into groups of ten by id.
fn by_decade(a: &u32, b: &u32) -> dedupe::Result<ClassificationResult> {
    Ok(if a / 10 == b / 10 {
        ClassificationResult::duplicate(0.9)
    } else {
        ClassificationResult::non_duplicate(0.9)
    })
}

fn refiner(max_small_cluster_size: usize) -> RefineCluster<u64, u32, u32> {
    RefineCluster::new(by_decade, Arc::new(|r: &u32| *r), ids::sequential())
        .with_max_small_cluster_size(max_small_cluster_size)
        .with_seed(42)
}

fn bench_refine(c: &mut Criterion) {
    let mut group = c.benchmark_group("refine");

    // Two groups glued together: 5 + 4 records.
    let small: Vec<u32> = (10..15).chain(20..24).collect();
    group.bench_function("exact_n9", |b| {
        b.iter(|| {
            let mut refine = refiner(10);
            refine
                .refine(vec![Cluster::new(0, black_box(small.clone()))], &[])
                .unwrap();
        })
    });

    let large: Vec<u32> = (0..200).collect();
    group.bench_function("heuristic_n200_m10", |b| {
        b.iter(|| {
            let mut refine = refiner(10);
            refine
                .refine(vec![Cluster::new(0, black_box(large.clone()))], &[])
                .unwrap();
        })
    });

    group.finish();
}

fn bench_transitive_closure(c: &mut Criterion) {
    let mut group = c.benchmark_group("transitive_closure");

    let mut rng = StdRng::seed_from_u64(42);
    let n = 10_000u32;
    let candidates: Vec<Candidate<u32>> = (0..20_000)
        .map(|_| Candidate::new(rng.random_range(0..n), rng.random_range(0..n)))
        .collect();

    group.bench_function("pairs20000_records10000", |b| {
        b.iter(|| {
            let mut closure: TransitiveClosure<u64, u32, u32> =
                TransitiveClosure::new(Arc::new(|r: &u32| *r), ids::sequential());
            closure.cluster_duplicates(black_box(&candidates));
        })
    });

    group.finish();
}

criterion_group!(benches, bench_refine, bench_transitive_closure);
criterion_main!(benches);
