//! # Resolution Benchmarks
//!
//! Performance benchmarks for compref-core key and identifier resolution.
//!
//! Run with: `cargo bench -p compref-core`

use compref_core::{
    ComponentReport, InMemoryIndex, KeyResolver, RawComponentNode, ReportMetadata,
    SequentialUuids, report_from_bytes, report_to_bytes,
};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

/// A project with one module holding N files directly.
fn create_wide_report(size: usize) -> ComponentReport {
    let files = (0..size).map(|i| i as u32 + 3);
    let mut nodes = vec![
        RawComponentNode::project(1, "PROJECT").with_children([2]),
        RawComponentNode::module(2, "MODULE").with_children(files.clone()),
    ];
    nodes.extend(files.map(|r| RawComponentNode::file(r, format!("src/File{r}.java"))));

    ComponentReport::from_components(ReportMetadata::new(1).with_branch("main"), nodes)
        .expect("build report")
}

/// A chain of N directories, alternating with a module every tenth level.
fn create_deep_report(size: usize) -> ComponentReport {
    let mut nodes = vec![RawComponentNode::project(1, "PROJECT").with_children([2])];
    for i in 0..size {
        let r = i as u32 + 2;
        let node = if i % 10 == 0 {
            RawComponentNode::module(r, format!("MODULE{r}"))
        } else {
            RawComponentNode::directory(r, format!("d{r}"))
        };
        nodes.push(if i + 1 < size { node.with_children([r + 1]) } else { node });
    }

    ComponentReport::from_components(ReportMetadata::new(1), nodes).expect("build report")
}

fn resolve(report: &ComponentReport, index: &InMemoryIndex) -> usize {
    let mut minter = SequentialUuids::default();
    KeyResolver::new(index, &mut minter)
        .resolve(report)
        .map(|r| r.cache.len())
        .unwrap_or(0)
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_resolve_wide(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_wide");

    for size in [100, 1000, 10000].iter() {
        let report = create_wide_report(*size);
        let index = InMemoryIndex::new();
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(resolve(&report, &index)));
        });
    }

    group.finish();
}

fn bench_resolve_deep(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_deep");

    for size in [100, 1000, 10000].iter() {
        let report = create_deep_report(*size);
        let index = InMemoryIndex::new();
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(resolve(&report, &index)));
        });
    }

    group.finish();
}

fn bench_resolve_reusing(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_reusing");

    for size in [100, 1000, 10000].iter() {
        let report = create_wide_report(*size);
        let mut minter = SequentialUuids::seeded("previous");
        let previous = KeyResolver::new(&InMemoryIndex::new(), &mut minter)
            .resolve(&report)
            .expect("resolve");
        let index = InMemoryIndex::from_cache(&previous.cache);

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(resolve(&report, &index)));
        });
    }

    group.finish();
}

fn bench_binary_report(c: &mut Criterion) {
    let mut group = c.benchmark_group("binary_report");

    for size in [100, 1000, 10000].iter() {
        let bytes = report_to_bytes(&create_wide_report(*size)).expect("encode");
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(report_from_bytes(&bytes).map(|r| r.components().count())));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_resolve_wide,
    bench_resolve_deep,
    bench_resolve_reusing,
    bench_binary_report
);
criterion_main!(benches);
