//! Criterion benchmarks for the metrics engine.
//!
//! Run with: `cargo bench -p pledgeboard-runner`
//!
//! Benchmarks:
//! 1. Trailing returns over all four periods
//! 2. Risk statistics (daily returns, sample stdev, drawdown)
//! 3. Full bundle metrics including dividends and chart data

use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use pledgeboard_core::{DividendEvent, PriceTable};
use pledgeboard_runner::{risk_statistics, trailing_returns, BundleMetrics, Period};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_table(rows: usize, cols: usize) -> PriceTable {
    let start = NaiveDate::from_ymd_opt(2010, 1, 4).unwrap();
    let dates = (0..rows).map(|i| start + Duration::days(i as i64)).collect();
    let symbols = (0..cols).map(|c| format!("SYM{c}")).collect();
    let columns = (0..cols)
        .map(|c| {
            (0..rows)
                .map(|i| 100.0 + c as f64 + (i as f64 * 0.05).sin() * 10.0 + i as f64 * 0.01)
                .collect()
        })
        .collect();
    let dividends = (0..rows)
        .step_by(63)
        .map(|i| DividendEvent {
            date: start + Duration::days(i as i64),
            amount: 0.4,
        })
        .collect();
    PriceTable::new(dates, symbols, columns)
        .unwrap()
        .with_dividends("SYM0", dividends)
}

// ── 1. Trailing Returns ──────────────────────────────────────────────

fn bench_trailing_returns(c: &mut Criterion) {
    let mut group = c.benchmark_group("trailing_returns");
    for rows in [252, 1_000, 3_500] {
        let table = make_table(rows, 3);
        group.bench_with_input(BenchmarkId::from_parameter(rows), &table, |b, t| {
            b.iter(|| {
                let _ = trailing_returns(black_box(t), &Period::ALL);
            });
        });
    }
    group.finish();
}

// ── 2. Risk Statistics ───────────────────────────────────────────────

fn bench_risk_statistics(c: &mut Criterion) {
    let mut group = c.benchmark_group("risk_statistics");
    for rows in [252, 1_000, 3_500] {
        let table = make_table(rows, 3);
        group.bench_with_input(BenchmarkId::from_parameter(rows), &table, |b, t| {
            b.iter(|| {
                let _ = risk_statistics(black_box(t));
            });
        });
    }
    group.finish();
}

// ── 3. Bundle Metrics ────────────────────────────────────────────────

fn bench_bundle_metrics(c: &mut Criterion) {
    let table = make_table(3_500, 3);
    let symbols = vec!["SYM0".to_string(), "SYM1".to_string()];
    c.bench_function("bundle_metrics_3500x3", |b| {
        b.iter(|| {
            let _ = BundleMetrics::compute(black_box(&symbols), black_box(&table));
        });
    });
}

criterion_group!(
    benches,
    bench_trailing_returns,
    bench_risk_statistics,
    bench_bundle_metrics
);
criterion_main!(benches);
