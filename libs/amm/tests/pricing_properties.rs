//! Pricing Engine Property Tests
//!
//! Invariants that must hold for any market shape and any sequence of valid
//! trades, independent of the specific reserves involved.

use outcome_amm::{AmmCalculator, AmmConfig, MarketState, OutcomeState, TradeAction};
use proptest::prelude::*;
use std::collections::BTreeMap;

fn calculator(fee_rate: f64) -> AmmCalculator {
    AmmCalculator::new(AmmConfig::with_fee_rate(fee_rate)).unwrap()
}

fn outcome_names(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("outcome_{}", i)).collect()
}

/// Market with arbitrary reserves and prices consistent with them
fn market_from_reserves(reserves: &[f64]) -> MarketState {
    let calc = calculator(0.0);
    let outcomes: BTreeMap<String, OutcomeState> = outcome_names(reserves.len())
        .into_iter()
        .zip(reserves)
        .map(|(id, r)| {
            (
                id,
                OutcomeState {
                    shares: *r,
                    reserve: *r,
                    current_price: 0.0,
                },
            )
        })
        .collect();
    let mut market = MarketState {
        k_constant: outcomes.values().map(|o| o.reserve).product(),
        total_liquidity: outcomes.values().map(|o| o.reserve).sum(),
        outcomes,
    };
    let prices = calc.calculate_current_prices(&market).unwrap();
    for (id, outcome) in market.outcomes.iter_mut() {
        outcome.current_price = prices[id];
    }
    market
}

#[derive(Debug, Clone)]
struct TradeStep {
    outcome: usize,
    action: TradeAction,
    /// Dollars for buys, fraction of issued shares for sells
    size: f64,
}

prop_compose! {
    fn trade_step()
        (
            outcome in 0usize..10,
            is_buy in any::<bool>(),
            dollars in 1.0f64..5_000.0,
            fraction in 0.01f64..=1.0,
        ) -> TradeStep {
        if is_buy {
            TradeStep { outcome, action: TradeAction::Buy, size: dollars }
        } else {
            TradeStep { outcome, action: TradeAction::Sell, size: fraction }
        }
    }
}

proptest! {
    /// Property: projected prices always sum to one
    #[test]
    fn prices_sum_to_one(reserves in prop::collection::vec(0.5f64..100_000.0, 2..=10)) {
        let market = market_from_reserves(&reserves);
        let prices = calculator(0.0).calculate_current_prices(&market).unwrap();

        let sum: f64 = prices.values().sum();
        prop_assert!((sum - 1.0).abs() < 1e-9, "price sum {}", sum);
        prop_assert!(prices.values().all(|p| *p > 0.0 && *p < 1.0));
    }

    /// Property: no sequence of valid trades drives a reserve to zero
    #[test]
    fn reserves_stay_positive(
        n in 2usize..=6,
        liquidity in 100.0f64..50_000.0,
        fee_rate in 0.0f64..0.1,
        steps in prop::collection::vec(trade_step(), 1..40),
    ) {
        let calc = calculator(fee_rate);
        let names = outcome_names(n);
        let mut market = calc.initialize_market(&names, liquidity).unwrap();

        for step in steps {
            let id = &names[step.outcome % n];
            let result = match step.action {
                TradeAction::Buy => calc.calculate_buy(&market, id, step.size).unwrap(),
                TradeAction::Sell => {
                    let issued = market.outcomes[id].shares;
                    if issued <= 0.0 {
                        continue;
                    }
                    calc.calculate_sell(&market, id, issued * step.size).unwrap()
                }
            };
            market = result.apply_to(&market);

            prop_assert!(
                market.outcomes.values().all(|o| o.reserve > 0.0),
                "non-positive reserve after {:?}: {:?}", step, market
            );
            let sum: f64 = market.outcomes.values().map(|o| o.current_price).sum();
            prop_assert!((sum - 1.0).abs() < 1e-9);
        }
    }

    /// Property: spending more buys strictly more shares and lifts the price
    #[test]
    fn buy_is_monotonic(
        n in 2usize..=6,
        liquidity in 100.0f64..100_000.0,
        fraction in 0.001f64..1.0,
        step_up in 0.01f64..1.0,
    ) {
        let calc = calculator(0.02);
        let names = outcome_names(n);
        let market = calc.initialize_market(&names, liquidity).unwrap();
        let small_amount = liquidity * fraction;
        let large_amount = small_amount * (1.0 + step_up);

        let small = calc.calculate_buy(&market, &names[0], small_amount).unwrap();
        let large = calc.calculate_buy(&market, &names[0], large_amount).unwrap();

        prop_assert!(large.shares_received > small.shares_received);
        prop_assert!(small.new_prices[&names[0]] > 1.0 / n as f64);
        prop_assert!(large.new_prices[&names[0]] > small.new_prices[&names[0]]);
        prop_assert!(small.new_reserves[&names[0]] < market.outcomes[&names[0]].reserve);
    }

    /// Property: a single buy never drains more than the capped share of a reserve
    #[test]
    fn buy_cannot_drain_reserve(
        reserves in prop::collection::vec(1.0f64..10_000.0, 2..=8),
        amount in 1.0f64..1e12,
    ) {
        let market = market_from_reserves(&reserves);
        let target = "outcome_0";
        let pre = market.outcomes[target].reserve;

        let result = calculator(0.0).calculate_buy(&market, target, amount).unwrap();

        prop_assert!(result.shares_received <= pre * 0.95 + 1e-9);
        prop_assert!(
            result.new_reserves[target] >= 0.05 * pre * (1.0 - 1e-12),
            "reserve {} fell below floor of {}", result.new_reserves[target], 0.05 * pre
        );
    }

    /// Property: the sell heuristic always pays below the pre-trade price
    #[test]
    fn sell_pays_below_current_price(
        n in 2usize..=10,
        fraction in 0.001f64..=1.0,
    ) {
        let calc = calculator(0.02);
        let names = outcome_names(n);
        let market = calc.initialize_market(&names, 1000.0).unwrap();
        let issued = market.outcomes[&names[1]].shares;

        let result = calc.calculate_sell(&market, &names[1], issued * fraction).unwrap();

        prop_assert!(result.total_cost > 0.0);
        prop_assert!(result.effective_price < 1.0 / n as f64);
        prop_assert!(result.price_impact < 0.0);
    }
}
