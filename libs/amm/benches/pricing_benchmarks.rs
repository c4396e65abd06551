//! Pricing throughput benchmarks
//!
//! Measures buy/sell quoting and rebalancing across market widths to keep the
//! per-trade cost of the calculator visible as outcome counts grow.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use outcome_amm::{AmmCalculator, AmmConfig, MarketState};

fn seeded_market(calc: &AmmCalculator, outcomes: usize) -> MarketState {
    let names: Vec<String> = (0..outcomes).map(|i| format!("outcome_{}", i)).collect();
    let mut market = calc.initialize_market(&names, 10_000.0).unwrap();
    // Move off the symmetric starting point
    for (i, name) in names.iter().enumerate() {
        market = calc
            .calculate_buy(&market, name, 25.0 * (i + 1) as f64)
            .unwrap()
            .apply_to(&market);
    }
    market
}

fn bench_buy(c: &mut Criterion) {
    let calc = AmmCalculator::new(AmmConfig::with_fee_rate(0.02)).unwrap();
    let mut group = c.benchmark_group("calculate_buy");

    for outcomes in [2usize, 3, 5, 10] {
        let market = seeded_market(&calc, outcomes);
        group.bench_with_input(BenchmarkId::from_parameter(outcomes), &market, |b, market| {
            b.iter(|| {
                calc.calculate_buy(black_box(market), black_box("outcome_0"), black_box(150.0))
                    .unwrap()
            })
        });
    }
    group.finish();
}

fn bench_sell(c: &mut Criterion) {
    let calc = AmmCalculator::new(AmmConfig::with_fee_rate(0.02)).unwrap();
    let mut group = c.benchmark_group("calculate_sell");

    for outcomes in [2usize, 3, 5, 10] {
        let market = seeded_market(&calc, outcomes);
        group.bench_with_input(BenchmarkId::from_parameter(outcomes), &market, |b, market| {
            b.iter(|| {
                calc.calculate_sell(black_box(market), black_box("outcome_0"), black_box(10.0))
                    .unwrap()
            })
        });
    }
    group.finish();
}

fn bench_rebalance(c: &mut Criterion) {
    let calc = AmmCalculator::default();
    let market = seeded_market(&calc, 10);

    c.bench_function("rebalance_market_10", |b| {
        b.iter(|| calc.rebalance_market(black_box(&market)).unwrap())
    });
}

criterion_group!(benches, bench_buy, bench_sell, bench_rebalance);
criterion_main!(benches);
