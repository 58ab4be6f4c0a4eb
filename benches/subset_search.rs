//! Best-subset search benchmark
//!
//! Exhaustive search fits every combination of design columns, so cost grows
//! combinatorially with the maximum subset size. This tracks the QR hot path
//! across the sizes the CLI accepts.
//!
//! # Run Instructions
//!
//! ```bash
//! cargo bench --bench subset_search
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use mtreport::annotate::{annotate, AnnotatedTable};
use mtreport::config::AnalysisConfig;
use mtreport::dataset::Dataset;
use mtreport::model::{best_subsets, fit_models, DesignMatrix, Formula};

fn bundled_table() -> AnnotatedTable {
    annotate(&Dataset::bundled().unwrap()).unwrap()
}

/// Benchmark: subset search over the 16 full-model columns by max size
fn bench_best_subsets(c: &mut Criterion) {
    let table = bundled_table();
    let design = DesignMatrix::for_formula(&table, &Formula::full()).unwrap();
    let y = table.response();

    let mut group = c.benchmark_group("best_subsets_max_size");
    group.sample_size(10);
    for max_size in [2, 4, 6, 8] {
        group.bench_with_input(BenchmarkId::from_parameter(max_size), &max_size, |b, &size| {
            b.iter(|| best_subsets(black_box(&design), black_box(&y), size).unwrap());
        });
    }
    group.finish();
}

/// Benchmark: every candidate model with a small subset search
fn bench_fit_models(c: &mut Criterion) {
    let table = bundled_table();
    let config = AnalysisConfig {
        max_subset_size: 4,
        ..AnalysisConfig::default()
    };

    c.bench_function("fit_models_max_size_4", |b| {
        b.iter(|| fit_models(black_box(&table), black_box(&config)).unwrap());
    });
}

criterion_group!(benches, bench_best_subsets, bench_fit_models);
criterion_main!(benches);
