//! End-to-end market lifecycle scenarios
//!
//! Exercises the calculator the way the trading API and the maintenance job
//! drive it: seed a market, price trades, persist snapshots, repair drift.

use outcome_amm::{
    dec, AmmCalculator, AmmConfig, AmmError, MarketState, TradeAction, DEFAULT_LIQUIDITY,
};
use std::sync::Arc;

fn close(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() <= tolerance
}

#[test]
fn test_home_away_buy_scenario() {
    let calc = AmmCalculator::new(AmmConfig::with_fee_rate(0.0)).unwrap();
    let market = calc
        .initialize_market(&["home", "away"], DEFAULT_LIQUIDITY)
        .unwrap();

    let trade = calc.calculate_buy(&market, "home", 100.0).unwrap();

    assert!(trade.shares_received > 0.0);
    assert!(trade.new_reserves["home"] < 500.0);
    assert!(trade.new_reserves["away"] > 500.0);
    assert!(trade.new_prices["home"] > 0.5);
    assert_eq!(trade.fees, 0.0);
}

#[test]
fn test_trade_lifecycle_through_json_snapshots() {
    let calc = AmmCalculator::new(AmmConfig::with_fee_rate(0.03)).unwrap();
    let market = calc
        .initialize_market(&["home_win", "draw", "away_win"], 3000.0)
        .unwrap();

    // Persisted and reloaded between every trade, as the settlement layer does
    let stored = serde_json::to_string(&market).unwrap();
    assert!(stored.contains("\"kConstant\""));
    let loaded: MarketState = serde_json::from_str(&stored).unwrap();

    let buy = calc.calculate_buy(&loaded, "draw", 100.0).unwrap();
    let ledger = buy.ledger_entry().unwrap();
    assert_eq!(ledger.gross, dec!(100));
    assert_eq!(ledger.fees, dec!(3));
    assert_eq!(ledger.net, dec!(97));

    let after_buy = buy.apply_to(&loaded);
    assert_eq!(after_buy.k_constant, loaded.k_constant);
    assert!(calc.validate_market_state(&after_buy));

    let sell = calc
        .calculate_sell(&after_buy, "draw", buy.shares_received)
        .unwrap();
    assert_eq!(sell.action, TradeAction::Sell);
    assert!(sell.total_cost < 100.0, "round trip should lose to fees and spread");
    let ledger = sell.ledger_entry().unwrap();
    assert_eq!(ledger.gross, ledger.net + ledger.fees);

    let after_sell = sell.apply_to(&after_buy);
    assert!(close(after_sell.outcomes["draw"].shares, 1000.0, 1e-9));
    assert!(after_sell.outcomes.values().all(|o| o.reserve > 0.0));
}

#[test]
fn test_sell_boundary() {
    let calc = AmmCalculator::default();
    let market = calc.initialize_market(&["yes", "no"], 1000.0).unwrap();
    let issued = market.outcomes["yes"].shares;

    assert!(calc.calculate_sell(&market, "yes", issued).is_ok());
    assert!(matches!(
        calc.calculate_sell(&market, "yes", issued + 0.0001),
        Err(AmmError::InsufficientShares { .. })
    ));
}

#[test]
fn test_estimate_matches_full_trade_without_deltas() {
    let calc = AmmCalculator::default();
    let market = calc.initialize_market(&["yes", "no"], 1000.0).unwrap();

    let preview = calc
        .estimate_trade(&market, "no", "sell".parse().unwrap(), 50.0)
        .unwrap();
    let full = calc.calculate_sell(&market, "no", 50.0).unwrap();

    assert_eq!(preview.total_cost, full.total_cost);
    assert_eq!(preview.fees, full.fees);
    let json = serde_json::to_value(&preview).unwrap();
    assert!(json.get("newShares").is_none());
}

#[test]
fn test_rebalance_is_idempotent_after_drift() {
    let calc = AmmCalculator::new(AmmConfig::with_fee_rate(0.02)).unwrap();
    let mut market = calc
        .initialize_market(&["a", "b", "c", "d"], 2000.0)
        .unwrap();
    for (outcome, amount) in [("a", 150.0), ("c", 40.0), ("a", 300.0), ("d", 75.0)] {
        market = calc
            .calculate_buy(&market, outcome, amount)
            .unwrap()
            .apply_to(&market);
    }
    let sell = calc.calculate_sell(&market, "a", 200.0).unwrap();
    market = sell.apply_to(&market);

    let once = calc.rebalance_market(&market).unwrap();
    let twice = calc.rebalance_market(&once).unwrap();

    assert!(close(once.reserve_sum(), 2000.0, 1e-6));
    assert!(!calc.inspect_market_state(&once).needs_rebalance());
    for (id, outcome) in &once.outcomes {
        assert!(close(outcome.current_price, market.outcomes[id].current_price, 1e-9));
        assert!(close(outcome.reserve, twice.outcomes[id].reserve, 1e-9));
        assert!(close(outcome.current_price, twice.outcomes[id].current_price, 1e-12));
        assert_eq!(outcome.shares, market.outcomes[id].shares);
    }
    assert!(close(once.k_constant, twice.k_constant, once.k_constant * 1e-12));
}

#[test]
fn test_fee_schedules_are_independent() {
    let retail = AmmCalculator::new(AmmConfig::with_fee_rate(0.05)).unwrap();
    let promo = AmmCalculator::new(AmmConfig::with_fee_rate(0.0)).unwrap();
    let market = promo.initialize_market(&["yes", "no"], 1000.0).unwrap();

    let charged = retail.calculate_buy(&market, "yes", 100.0).unwrap();
    let free = promo.calculate_buy(&market, "yes", 100.0).unwrap();

    assert!(close(charged.fees, 5.0, 1e-12));
    assert_eq!(free.fees, 0.0);
    assert!(free.shares_received > charged.shares_received);
}

#[test]
fn test_calculator_shared_across_threads() {
    let calc = Arc::new(AmmCalculator::default());
    let market = Arc::new(calc.initialize_market(&["yes", "no"], 1000.0).unwrap());

    let handles: Vec<_> = (1..=4)
        .map(|i| {
            let calc = Arc::clone(&calc);
            let market = Arc::clone(&market);
            std::thread::spawn(move || {
                calc.calculate_buy(&market, "yes", 10.0 * i as f64)
                    .unwrap()
                    .shares_received
            })
        })
        .collect();

    let shares: Vec<f64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(shares.windows(2).all(|w| w[1] > w[0]));
    // Snapshot untouched by pricing
    assert_eq!(market.outcomes["yes"].reserve, 500.0);
}
