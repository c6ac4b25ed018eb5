//! FILENAME: core/pivot-engine/benches/pivot_calculations.rs
//! Whole-pivot recompute over synthetic sales data.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pivot_engine::{
    calculate_pivot, AggregationKind, CalculatedMeasure, FilterConfig, PivotConfig,
    PivotFieldConfig, PivotOptions, Row, ValueFieldConfig,
};

const REGIONS: [&str; 6] = ["North", "South", "East", "West", "Central", "Overseas"];
const PRODUCTS: [&str; 8] = ["Widget", "Gadget", "Gizmo", "Doohickey", "Sprocket", "Cog", "Flange", "Bolt"];
const QUARTERS: [&str; 4] = ["Q1", "Q2", "Q3", "Q4"];

fn build_rows(count: usize) -> Vec<Row> {
    (0..count)
        .map(|i| {
            Row::new(i as u32)
                .with("Region", REGIONS[i % REGIONS.len()])
                .with("Product", PRODUCTS[(i / 7) % PRODUCTS.len()])
                .with("Quarter", QUARTERS[(i / 3) % QUARTERS.len()])
                .with("Customer", format!("C{}", i % 500))
                .with("Sales", (i % 1000) as f64 * 1.5)
                .with("Cost", (i % 700) as f64)
        })
        .collect()
}

fn sum_config() -> PivotConfig {
    PivotConfig {
        rows: vec![PivotFieldConfig::new("Region"), PivotFieldConfig::new("Product")],
        columns: vec![PivotFieldConfig::new("Quarter")],
        values: vec![ValueFieldConfig::new("Sales", AggregationKind::Sum)],
        ..Default::default()
    }
}

fn mixed_config() -> PivotConfig {
    PivotConfig {
        rows: vec![PivotFieldConfig::new("Region"), PivotFieldConfig::new("Customer")],
        columns: vec![PivotFieldConfig::new("Quarter")],
        values: vec![
            ValueFieldConfig::new("Sales", AggregationKind::Sum),
            ValueFieldConfig::new("Cost", AggregationKind::Sum),
            ValueFieldConfig::new("Sales", AggregationKind::Average),
            ValueFieldConfig::new("Customer", AggregationKind::UniqueCount),
        ],
        filters: vec![FilterConfig::new("Region", ["North", "South", "East"])],
        calculated_measures: vec![CalculatedMeasure::new("m1", "Margin", "Sales - Cost")],
    }
}

fn bench_calculate(c: &mut Criterion) {
    let options = PivotOptions::default();
    let mut group = c.benchmark_group("calculate_pivot");

    for size in [1_000usize, 10_000, 100_000] {
        let rows = build_rows(size);
        group.throughput(Throughput::Elements(size as u64));

        let config = sum_config();
        group.bench_with_input(BenchmarkId::new("sum", size), &rows, |b, rows| {
            b.iter(|| calculate_pivot(black_box(rows), &config, &options))
        });

        let config = mixed_config();
        group.bench_with_input(BenchmarkId::new("mixed", size), &rows, |b, rows| {
            b.iter(|| calculate_pivot(black_box(rows), &config, &options))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_calculate);
criterion_main!(benches);
