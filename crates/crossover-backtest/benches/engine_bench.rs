//! Benchmarks for series preparation and full backtest runs
//!
//! Run with: cargo bench --package crossover-backtest

use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use crossover_backtest::{prepare_series, BacktestConfig, BacktestEngine};
use crossover_core::PricePoint;
use crossover_strategies::MovingAverageCrossover;
use rand::{rngs::StdRng, Rng, SeedableRng};
use rust_decimal::Decimal;

/// Random walk of daily closes starting at 100.00, floored at 1.00
fn generate_random_walk(rng: &mut StdRng, days: usize) -> Vec<PricePoint> {
    let start = NaiveDate::from_ymd_opt(2000, 1, 3).unwrap();
    let mut cents: i64 = 10_000;

    (0..days)
        .map(|i| {
            cents = (cents + rng.gen_range(-250..=250)).max(100);
            PricePoint::new(start + Duration::days(i as i64), Decimal::new(cents, 2))
        })
        .collect()
}

fn bench_prepare_series(c: &mut Criterion) {
    let mut group = c.benchmark_group("prepare_series");
    let mut rng = StdRng::seed_from_u64(42);

    for days in [500, 2_500, 10_000].iter() {
        let prices = generate_random_walk(&mut rng, *days);
        group.bench_with_input(BenchmarkId::new("50_200", days), &prices, |b, prices| {
            b.iter(|| prepare_series(black_box(prices), 50, 200))
        });
    }

    group.finish();
}

fn bench_backtest_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("backtest_run");
    let mut rng = StdRng::seed_from_u64(7);
    let strategy = MovingAverageCrossover::new();

    for days in [500, 2_500, 10_000].iter() {
        let prices = generate_random_walk(&mut rng, *days);

        for (short_window, long_window) in [(5, 20), (50, 200)] {
            let engine = BacktestEngine::new(BacktestConfig {
                short_window,
                long_window,
                ..Default::default()
            });
            let id = format!("{}_{}/{}", short_window, long_window, days);

            group.bench_function(BenchmarkId::from_parameter(id), |b| {
                b.iter(|| engine.run("BENCH", black_box(&prices), &strategy))
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_prepare_series, bench_backtest_run);
criterion_main!(benches);
