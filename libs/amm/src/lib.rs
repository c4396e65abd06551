//! # Outcome AMM - Prediction Market Pricing Engine
//!
//! ## Purpose
//!
//! Constant-product market maker for markets with two or more mutually exclusive
//! outcomes. Prices buys and sells against a pool snapshot, reports slippage and
//! fees, and keeps the reserve product near its invariant `k`.
//!
//! ## Integration Points
//!
//! - **Input Sources**: `MarketState` snapshots loaded by the trading API under a
//!   per-market lock or version check
//! - **Output Destinations**: `TradeResult` values persisted by the settlement layer
//!   together with a `LedgerEntry`, `TradeEstimate` previews for the UI
//! - **Maintenance**: `MarketHealth` reports and `rebalance_market` for drift repair
//!
//! ## Architecture Role
//!
//! ```text
//! Trading API ──load snapshot──→ [AmmCalculator] ──TradeResult──→ Settlement
//!      ↑                              │                              │
//!      └──────── persist new state ←──┴──── LedgerEntry (fees) ──────┘
//! ```
//!
//! The calculator is a pure function of `(AmmConfig, MarketState, args)`. It never
//! holds market state between calls and is safe to share across threads.
//!
//! ## Example
//!
//! ```rust
//! use outcome_amm::{AmmCalculator, AmmConfig};
//!
//! let calculator = AmmCalculator::new(AmmConfig::with_fee_rate(0.02)).unwrap();
//! let market = calculator.initialize_market(&["home", "away"], 1000.0).unwrap();
//!
//! let trade = calculator.calculate_buy(&market, "home", 100.0).unwrap();
//! assert!(trade.new_prices["home"] > 0.5);
//!
//! let next = trade.apply_to(&market);
//! assert!(calculator.validate_market_state(&next));
//! ```

pub mod config;
pub mod cpmm_math;
pub mod errors;
pub mod market_state;
pub mod trade;

pub use config::{AmmConfig, RiskThresholds, DEFAULT_LIQUIDITY};
pub use cpmm_math::{AmmCalculator, MarketHealth};
pub use errors::{AmmError, Result};
pub use market_state::{MarketState, OutcomeState};
pub use trade::{LedgerEntry, TradeAction, TradeEstimate, TradeResult};

/// Decimal type used for ledger amounts
pub use rust_decimal::Decimal;
pub use rust_decimal_macros::dec;
