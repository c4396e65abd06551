//! Constant-product pricing for multi-outcome prediction markets
//!
//! Each outcome holds a reserve; the pool targets `∏ reserve_i = k`. Buying an
//! outcome pulls shares out of its reserve and pays the remaining outcomes,
//! so the bought outcome's reserve shrinks and its price rises. Prices are the
//! normalized inverse reserves and always sum to one.
//!
//! Every operation takes a snapshot and returns new values. Nothing is cached
//! between calls; serializing trades per market is the caller's job.

use crate::config::AmmConfig;
use crate::errors::{AmmError, Result};
use crate::market_state::{MarketState, OutcomeState};
use crate::trade::{TradeAction, TradeEstimate, TradeResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, trace, warn};

/// Diagnostic summary of a market snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketHealth {
    pub outcome_count: usize,
    pub reserves_positive: bool,
    pub shares_positive: bool,
    pub reserve_product: f64,
    /// Relative distance of the reserve product from the invariant target
    pub k_deviation: f64,
    pub k_within_tolerance: bool,
    pub price_sum: f64,
    pub price_sum_within_tolerance: bool,
}

impl MarketHealth {
    /// Whether the snapshot is safe to price against
    pub fn is_valid(&self) -> bool {
        self.outcome_count > 0 && self.reserves_positive && self.price_sum_within_tolerance
    }

    /// Whether maintenance should run [`AmmCalculator::rebalance_market`]
    pub fn needs_rebalance(&self) -> bool {
        !self.k_within_tolerance || !self.price_sum_within_tolerance
    }
}

/// Stateless pricing engine bound to one fee schedule
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AmmCalculator {
    config: AmmConfig,
}

impl AmmCalculator {
    pub fn new(config: AmmConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AmmConfig {
        &self.config
    }

    /// Seed a new market with equal reserves and equal prices
    ///
    /// # Arguments
    /// * `outcome_ids` - At least two unique outcome identifiers
    /// * `total_liquidity` - Dollar liquidity split evenly across outcomes
    pub fn initialize_market<S: AsRef<str>>(
        &self,
        outcome_ids: &[S],
        total_liquidity: f64,
    ) -> Result<MarketState> {
        if outcome_ids.is_empty() {
            return Err(AmmError::NoOutcomes);
        }
        if outcome_ids.len() < 2 {
            return Err(AmmError::TooFewOutcomes {
                count: outcome_ids.len(),
            });
        }
        if !(total_liquidity.is_finite() && total_liquidity > 0.0) {
            return Err(AmmError::InvalidLiquidity {
                amount: total_liquidity,
            });
        }

        let mut seen = HashSet::with_capacity(outcome_ids.len());
        for id in outcome_ids {
            if !seen.insert(id.as_ref()) {
                return Err(AmmError::DuplicateOutcome {
                    outcome_id: id.as_ref().to_string(),
                });
            }
        }

        let n = outcome_ids.len() as f64;
        let reserve = total_liquidity / n;
        let outcomes: BTreeMap<String, OutcomeState> = outcome_ids
            .iter()
            .map(|id| {
                (
                    id.as_ref().to_string(),
                    OutcomeState {
                        shares: reserve,
                        reserve,
                        current_price: 1.0 / n,
                    },
                )
            })
            .collect();
        let k_constant = outcomes.values().map(|o| o.reserve).product();

        debug!(
            outcomes = outcome_ids.len(),
            total_liquidity, k_constant, "Initialized market"
        );

        Ok(MarketState {
            outcomes,
            total_liquidity,
            k_constant,
        })
    }

    /// Price spending `dollar_amount` on shares of `outcome_id`
    pub fn calculate_buy(
        &self,
        market: &MarketState,
        outcome_id: &str,
        dollar_amount: f64,
    ) -> Result<TradeResult> {
        let outcome = lookup(market, outcome_id)?;
        if !(dollar_amount.is_finite() && dollar_amount > 0.0) {
            return Err(AmmError::InvalidAmount {
                amount: dollar_amount,
            });
        }

        let n = market.outcome_count();
        if n < 2 {
            return Err(AmmError::pool(format!(
                "buy needs at least 2 outcomes, market has {}",
                n
            )));
        }
        let thresholds = &self.config.thresholds;
        let k = self.invariant_target(market);

        let fees = dollar_amount * self.config.fee_rate;
        let amount_after_fees = dollar_amount - fees;

        let r_buy = outcome.reserve;
        if !(r_buy.is_finite() && r_buy > 0.0) {
            return Err(AmmError::pool(format!(
                "reserve for '{}' is not positive: {}",
                outcome_id, r_buy
            )));
        }
        let (other_sum, other_product) = others(market, outcome_id)
            .fold((0.0, 1.0), |(sum, product), o| (sum + o.reserve, product * o.reserve));

        let denominator = k + amount_after_fees * other_product;
        if !(denominator.is_finite() && denominator > 0.0) {
            return Err(AmmError::pool(format!(
                "buy denominator is not positive: {}",
                denominator
            )));
        }

        let exponent = 1.0 / (n - 1) as f64;
        let raw_shares = r_buy * (1.0 - (k / denominator).powf(exponent));
        let max_shares = r_buy * thresholds.max_buy_fraction;
        let shares = if raw_shares.is_nan() {
            0.0
        } else {
            raw_shares.clamp(0.0, max_shares)
        };
        if raw_shares > max_shares {
            debug!(
                outcome_id,
                raw_shares, max_shares, "Buy capped by anti-drain limit"
            );
        }

        let mut new_reserves: BTreeMap<String, f64> = market
            .outcomes
            .iter()
            .map(|(id, o)| {
                let reserve = if id == outcome_id {
                    o.reserve - shares
                } else if other_sum > 0.0 {
                    o.reserve + amount_after_fees * (o.reserve / other_sum)
                } else {
                    o.reserve
                };
                (id.clone(), reserve)
            })
            .collect();

        let new_k: f64 = new_reserves.values().product();
        if !(new_k.is_finite() && new_k > 0.0) {
            return Err(AmmError::pool(format!(
                "post-trade reserve product is not positive: {}",
                new_k
            )));
        }
        let drift = (new_k - k).abs() / k;
        if drift > thresholds.k_rebalance_tolerance {
            let scale = (k / new_k).powf(1.0 / n as f64);
            debug!(drift, scale, "Rescaling reserves toward k after buy");
            for reserve in new_reserves.values_mut() {
                *reserve *= scale;
            }
        }

        let drain_floor = r_buy * (1.0 - thresholds.max_buy_fraction);
        if let Some(reserve) = new_reserves.get_mut(outcome_id) {
            if *reserve < drain_floor {
                debug!(
                    outcome_id,
                    reserve = *reserve,
                    drain_floor,
                    "Holding bought reserve at drain floor"
                );
                *reserve = drain_floor;
            }
        }

        let mut new_shares = market.shares();
        if let Some(issued) = new_shares.get_mut(outcome_id) {
            *issued += shares;
        }

        let new_prices = normalized_prices(&new_reserves)?;
        let current_price = self.reference_price(market, outcome_id)?;
        let effective_price = if shares > 0.0 {
            dollar_amount / shares
        } else {
            current_price
        };
        let price_impact = price_impact(effective_price, current_price);

        trace!(
            outcome_id,
            dollar_amount,
            fees,
            amount_after_fees,
            k,
            denominator,
            shares,
            effective_price,
            price_impact,
            "Priced buy"
        );

        Ok(TradeResult {
            action: TradeAction::Buy,
            outcome_id: outcome_id.to_string(),
            shares_received: shares,
            effective_price,
            price_impact,
            total_cost: dollar_amount,
            fees,
            new_prices,
            new_reserves,
            new_shares,
        })
    }

    /// Price selling `shares_to_sell` shares of `outcome_id` back to the pool
    ///
    /// The payout is a slippage-adjusted heuristic, not the inverse of the
    /// buy curve, so a buy followed by a sell of the same shares loses value.
    pub fn calculate_sell(
        &self,
        market: &MarketState,
        outcome_id: &str,
        shares_to_sell: f64,
    ) -> Result<TradeResult> {
        let outcome = lookup(market, outcome_id)?;
        if !(shares_to_sell.is_finite() && shares_to_sell > 0.0) {
            return Err(AmmError::InvalidAmount {
                amount: shares_to_sell,
            });
        }
        if shares_to_sell > outcome.shares {
            return Err(AmmError::InsufficientShares {
                outcome_id: outcome_id.to_string(),
                requested: shares_to_sell,
                available: outcome.shares,
            });
        }
        if !(outcome.reserve.is_finite() && outcome.reserve > 0.0) {
            return Err(AmmError::pool(format!(
                "reserve for '{}' is not positive: {}",
                outcome_id, outcome.reserve
            )));
        }

        let n = market.outcome_count() as f64;
        let current_price = self.reference_price(market, outcome_id)?;

        let base_payout = shares_to_sell * current_price;
        let slippage_adjustment = (1.0 - (shares_to_sell / outcome.reserve) / 2.0).max(0.0);
        let multi_outcome_adjustment = 1.0 - 1.0 / (2.0 * n);
        let payout_before_fees = base_payout * slippage_adjustment * multi_outcome_adjustment;

        let fees = payout_before_fees * self.config.fee_rate;
        let payout = payout_before_fees - fees;

        let floor = self.config.thresholds.min_reserve_floor;
        let other_sum: f64 = others(market, outcome_id).map(|o| o.reserve).sum();
        let new_reserves: BTreeMap<String, f64> = market
            .outcomes
            .iter()
            .map(|(id, o)| {
                let reserve = if id == outcome_id {
                    o.reserve + shares_to_sell
                } else if other_sum > 0.0 {
                    (o.reserve - payout * (o.reserve / other_sum)).max(floor)
                } else {
                    o.reserve.max(floor)
                };
                (id.clone(), reserve)
            })
            .collect();

        let mut new_shares = market.shares();
        if let Some(issued) = new_shares.get_mut(outcome_id) {
            *issued -= shares_to_sell;
        }

        let new_prices = normalized_prices(&new_reserves)?;
        let effective_price = payout / shares_to_sell;
        let price_impact = price_impact(effective_price, current_price);

        trace!(
            outcome_id,
            shares_to_sell,
            base_payout,
            slippage_adjustment,
            multi_outcome_adjustment,
            fees,
            payout,
            price_impact,
            "Priced sell"
        );

        Ok(TradeResult {
            action: TradeAction::Sell,
            outcome_id: outcome_id.to_string(),
            shares_received: shares_to_sell,
            effective_price,
            price_impact,
            total_cost: payout,
            fees,
            new_prices,
            new_reserves,
            new_shares,
        })
    }

    /// Normalized prices implied by the current reserves
    pub fn calculate_current_prices(&self, market: &MarketState) -> Result<BTreeMap<String, f64>> {
        normalized_prices(&market.reserves())
    }

    /// Diagnostic view of the snapshot's invariants; never logs or fails
    pub fn inspect_market_state(&self, market: &MarketState) -> MarketHealth {
        let thresholds = &self.config.thresholds;
        let reserve_product = market.reserve_product();
        let k_deviation = match self.stored_invariant(market) {
            Some(k) => (reserve_product - k).abs() / k,
            None => f64::INFINITY,
        };
        let price_sum = market.price_sum();

        MarketHealth {
            outcome_count: market.outcome_count(),
            reserves_positive: market
                .outcomes
                .values()
                .all(|o| o.reserve.is_finite() && o.reserve > 0.0),
            shares_positive: market.outcomes.values().all(|o| o.shares > 0.0),
            reserve_product,
            k_deviation,
            k_within_tolerance: k_deviation <= thresholds.k_validation_tolerance,
            price_sum,
            price_sum_within_tolerance: (price_sum - 1.0).abs()
                <= thresholds.price_sum_tolerance,
        }
    }

    /// Check the snapshot before pricing against it
    ///
    /// Only positive reserves and a price sum near one decide the result;
    /// share and k deviations are reported as warnings.
    pub fn validate_market_state(&self, market: &MarketState) -> bool {
        let health = self.inspect_market_state(market);

        if health.outcome_count == 0 {
            warn!("Market has no outcomes");
        }
        if !health.reserves_positive {
            warn!("Market has non-positive reserves");
        }
        if !health.shares_positive {
            warn!("Market has outcomes with no issued shares");
        }
        if !health.k_within_tolerance {
            warn!(
                k_deviation = health.k_deviation,
                reserve_product = health.reserve_product,
                k_constant = market.k_constant,
                "Reserve product drifted from k"
            );
        }
        if !health.price_sum_within_tolerance {
            warn!(price_sum = health.price_sum, "Prices do not sum to 1");
        }

        health.is_valid()
    }

    /// Validate then price a trade, returning only the user-facing fields
    pub fn estimate_trade(
        &self,
        market: &MarketState,
        outcome_id: &str,
        action: TradeAction,
        amount: f64,
    ) -> Result<TradeEstimate> {
        if !self.validate_market_state(market) {
            return Err(AmmError::InvalidMarketState);
        }

        let result = match action {
            TradeAction::Buy => self.calculate_buy(market, outcome_id, amount)?,
            TradeAction::Sell => self.calculate_sell(market, outcome_id, amount)?,
        };
        Ok(result.into())
    }

    /// Snap reserves to the current prices at fixed total liquidity
    ///
    /// Prices are unchanged, shares are preserved, and `k_constant` becomes the
    /// product of the new reserves.
    pub fn rebalance_market(&self, market: &MarketState) -> Result<MarketState> {
        if market.outcomes.is_empty() {
            return Err(AmmError::NoOutcomes);
        }
        let liquidity = market.total_liquidity;
        if !(liquidity.is_finite() && liquidity > 0.0) {
            return Err(AmmError::pool(format!(
                "total liquidity is not positive: {}",
                liquidity
            )));
        }

        let stored_usable = market
            .outcomes
            .values()
            .all(|o| o.current_price.is_finite() && o.current_price > 0.0);
        let prices = if stored_usable {
            normalize(market.prices())
        } else {
            warn!("Stored prices unusable, rebalancing from reserve-implied prices");
            self.calculate_current_prices(market)?
        };

        let inverse_sum: f64 = prices.values().map(|p| 1.0 / p).sum();
        let targets: BTreeMap<String, f64> = prices
            .iter()
            .map(|(id, p)| (id.clone(), liquidity * (1.0 / p) / inverse_sum))
            .collect();
        let new_prices = normalized_prices(&targets)?;
        let k_constant: f64 = targets.values().product();

        debug!(
            previous_k = market.k_constant,
            k_constant,
            previous_product = market.reserve_product(),
            "Rebalanced market"
        );

        let outcomes = market
            .outcomes
            .iter()
            .map(|(id, o)| {
                (
                    id.clone(),
                    OutcomeState {
                        shares: o.shares,
                        reserve: targets[id],
                        current_price: new_prices[id],
                    },
                )
            })
            .collect();

        Ok(MarketState {
            outcomes,
            total_liquidity: liquidity,
            k_constant,
        })
    }

    /// Stored k, or the configured fallback when the snapshot has none
    fn stored_invariant(&self, market: &MarketState) -> Option<f64> {
        if market.k_constant.is_finite() && market.k_constant > 0.0 {
            Some(market.k_constant)
        } else {
            self.config.k_constant
        }
    }

    fn invariant_target(&self, market: &MarketState) -> f64 {
        self.stored_invariant(market).unwrap_or_else(|| {
            let product = market.reserve_product();
            warn!(
                k_constant = market.k_constant,
                product, "Market has no usable k, using live reserve product"
            );
            product
        })
    }

    /// Pre-trade price used for effective price and impact
    fn reference_price(&self, market: &MarketState, outcome_id: &str) -> Result<f64> {
        let stored = lookup(market, outcome_id)?.current_price;
        if stored.is_finite() && stored > 0.0 {
            return Ok(stored);
        }
        let projected = self.calculate_current_prices(market)?;
        Ok(projected.get(outcome_id).copied().unwrap_or(0.0))
    }
}

fn lookup<'a>(market: &'a MarketState, outcome_id: &str) -> Result<&'a OutcomeState> {
    market
        .outcome(outcome_id)
        .ok_or_else(|| AmmError::OutcomeNotFound {
            outcome_id: outcome_id.to_string(),
        })
}

fn others<'a>(
    market: &'a MarketState,
    outcome_id: &'a str,
) -> impl Iterator<Item = &'a OutcomeState> + 'a {
    market
        .outcomes
        .iter()
        .filter(move |(id, _)| id.as_str() != outcome_id)
        .map(|(_, o)| o)
}

/// Inverse-reserve prices normalized to sum to one
fn normalized_prices(reserves: &BTreeMap<String, f64>) -> Result<BTreeMap<String, f64>> {
    if reserves.is_empty() {
        return Err(AmmError::NoOutcomes);
    }
    if let Some((id, reserve)) = reserves
        .iter()
        .find(|(_, r)| !(r.is_finite() && **r > 0.0))
    {
        return Err(AmmError::pool(format!(
            "reserve for '{}' is not positive: {}",
            id, reserve
        )));
    }

    let inverse_sum: f64 = reserves.values().map(|r| 1.0 / r).sum();
    let prices = reserves
        .iter()
        .map(|(id, r)| (id.clone(), (1.0 / r) / inverse_sum))
        .collect();
    Ok(normalize(prices))
}

/// Rescale so the values sum to exactly one (up to rounding)
fn normalize(mut prices: BTreeMap<String, f64>) -> BTreeMap<String, f64> {
    let total: f64 = prices.values().sum();
    if total > 0.0 && total.is_finite() {
        for price in prices.values_mut() {
            *price /= total;
        }
    }
    prices
}

fn price_impact(effective_price: f64, current_price: f64) -> f64 {
    if current_price > 0.0 {
        (effective_price - current_price) / current_price * 100.0
    } else {
        0.0
    }
}
