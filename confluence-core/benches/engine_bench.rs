//! Criterion benchmarks for the signal engine hot paths.
//!
//! Benchmarks:
//! 1. `analyze` with the default rule table over 200 / 1000 / 5000 candles
//! 2. Individual indicators over the same lengths
//! 3. `analyze` with every rule enabled

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use confluence_core::confluence::{DojiRule, SupportResistanceRule};
use confluence_core::data::SyntheticProvider;
use confluence_core::indicators::{
    bollinger, ema, macd, rsi, stochastic, MovingAverage, RsiSmoothing,
};
use confluence_core::{analyze, CandleSeries, Interval, RuleConfig};

const SIZES: [usize; 3] = [200, 1000, 5000];

fn make_series(n: usize) -> CandleSeries {
    let candles = SyntheticProvider::new(11).generate("EUR/USD", Interval::M5, n);
    CandleSeries::new("EUR/USD", Interval::M5, candles).unwrap()
}

// ── 1. analyze ───────────────────────────────────────────────────────

fn bench_analyze(c: &mut Criterion) {
    let mut group = c.benchmark_group("analyze");
    let config = RuleConfig::default();
    for &n in &SIZES {
        let series = make_series(n);
        group.bench_with_input(BenchmarkId::new("default_rules", n), &series, |b, s| {
            b.iter(|| analyze(black_box(s), black_box(&config)).unwrap())
        });
    }
    group.finish();
}

// ── 2. Indicators ────────────────────────────────────────────────────

fn bench_indicators(c: &mut Criterion) {
    let mut group = c.benchmark_group("indicators");
    for &n in &SIZES {
        let series = make_series(n);
        let closes = series.closes();
        let highs = series.highs();
        let lows = series.lows();

        group.bench_with_input(BenchmarkId::new("ema_21", n), &closes, |b, v| {
            b.iter(|| ema(black_box(v), 21))
        });
        group.bench_with_input(BenchmarkId::new("rsi_14_wilder", n), &closes, |b, v| {
            b.iter(|| rsi(black_box(v), 14, RsiSmoothing::Wilder))
        });
        group.bench_with_input(BenchmarkId::new("macd_12_26_9", n), &closes, |b, v| {
            b.iter(|| macd(black_box(v), 12, 26, 9))
        });
        group.bench_with_input(BenchmarkId::new("bollinger_20", n), &closes, |b, v| {
            b.iter(|| bollinger(black_box(v), 20, 2.0, MovingAverage::Simple))
        });
        group.bench_function(BenchmarkId::new("stochastic_14_3", n), |b| {
            b.iter(|| stochastic(black_box(&highs), black_box(&lows), black_box(&closes), 14, 3))
        });
    }
    group.finish();
}

// ── 3. Full rule table ───────────────────────────────────────────────

fn bench_all_rules(c: &mut Criterion) {
    let mut config = RuleConfig::default();
    config.support_resistance = Some(SupportResistanceRule::default());
    config.doji = Some(DojiRule::default());
    let series = make_series(1000);

    c.bench_function("analyze/all_rules_1000", |b| {
        b.iter(|| analyze(black_box(&series), black_box(&config)).unwrap())
    });
}

criterion_group!(benches, bench_analyze, bench_indicators, bench_all_rules);
criterion_main!(benches);
