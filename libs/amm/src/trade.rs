//! Trade results, previews and ledger conversion

use crate::errors::{AmmError, Result};
use crate::market_state::{MarketState, OutcomeState};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Direction of a trade against the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeAction {
    Buy,
    Sell,
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeAction::Buy => write!(f, "buy"),
            TradeAction::Sell => write!(f, "sell"),
        }
    }
}

impl FromStr for TradeAction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "buy" => Ok(TradeAction::Buy),
            "sell" => Ok(TradeAction::Sell),
            other => Err(format!("unknown trade action '{}', expected buy or sell", other)),
        }
    }
}

/// Full outcome of a priced trade, including the post-trade pool
///
/// For sells, `shares_received` holds the number of shares sold and
/// `total_cost` the net payout returned to the trader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeResult {
    pub action: TradeAction,
    pub outcome_id: String,
    pub shares_received: f64,
    pub effective_price: f64,
    /// Percentage difference between effective and pre-trade price
    pub price_impact: f64,
    pub total_cost: f64,
    pub fees: f64,
    pub new_prices: BTreeMap<String, f64>,
    pub new_reserves: BTreeMap<String, f64>,
    pub new_shares: BTreeMap<String, f64>,
}

/// Read-only trade preview without pool deltas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeEstimate {
    pub action: TradeAction,
    pub outcome_id: String,
    pub shares_received: f64,
    pub effective_price: f64,
    pub price_impact: f64,
    pub total_cost: f64,
    pub fees: f64,
    pub new_prices: BTreeMap<String, f64>,
}

impl From<TradeResult> for TradeEstimate {
    fn from(result: TradeResult) -> Self {
        Self {
            action: result.action,
            outcome_id: result.outcome_id,
            shares_received: result.shares_received,
            effective_price: result.effective_price,
            price_impact: result.price_impact,
            total_cost: result.total_cost,
            fees: result.fees,
            new_prices: result.new_prices,
        }
    }
}

/// Monetary record of a trade for the settlement ledger
///
/// `gross = net + fees` holds exactly. For buys `gross` is what the trader
/// paid; for sells `net` is what the trader received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub action: TradeAction,
    pub outcome_id: String,
    pub shares: Decimal,
    pub gross: Decimal,
    pub fees: Decimal,
    pub net: Decimal,
}

const CASH_DP: u32 = 2;
const SHARE_DP: u32 = 6;

impl TradeResult {
    /// Next market snapshot after this trade; `k_constant` and liquidity carry over
    pub fn apply_to(&self, market: &MarketState) -> MarketState {
        let outcomes = market
            .outcomes
            .iter()
            .map(|(id, old)| {
                let next = OutcomeState {
                    shares: self.new_shares.get(id).copied().unwrap_or(old.shares),
                    reserve: self.new_reserves.get(id).copied().unwrap_or(old.reserve),
                    current_price: self
                        .new_prices
                        .get(id)
                        .copied()
                        .unwrap_or(old.current_price),
                };
                (id.clone(), next)
            })
            .collect();

        MarketState {
            outcomes,
            total_liquidity: market.total_liquidity,
            k_constant: market.k_constant,
        }
    }

    /// Ledger amounts rounded to cents (shares to 6 dp)
    pub fn ledger_entry(&self) -> Result<LedgerEntry> {
        let shares = to_decimal("shares_received", self.shares_received)?.round_dp(SHARE_DP);
        let fees = to_decimal("fees", self.fees)?.round_dp(CASH_DP);
        let amount = to_decimal("total_cost", self.total_cost)?.round_dp(CASH_DP);

        let (gross, net) = match self.action {
            TradeAction::Buy => (amount, amount - fees),
            TradeAction::Sell => (amount + fees, amount),
        };

        Ok(LedgerEntry {
            action: self.action,
            outcome_id: self.outcome_id.clone(),
            shares,
            gross,
            fees,
            net,
        })
    }
}

fn to_decimal(field: &'static str, value: f64) -> Result<Decimal> {
    if !value.is_finite() {
        return Err(AmmError::NonFiniteValue { field, value });
    }
    Decimal::from_f64(value).ok_or(AmmError::NonFiniteValue { field, value })
}
