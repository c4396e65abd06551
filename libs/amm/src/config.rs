//! Calculator configuration and risk thresholds
//!
//! Every calculator owns one immutable [`AmmConfig`]. Markets with different
//! fee schedules get different calculator instances; nothing here is global.

use crate::errors::{AmmError, Result};
use serde::{Deserialize, Serialize};

/// Default seed liquidity for a new market, in dollars
pub const DEFAULT_LIQUIDITY: f64 = 1000.0;

/// Default fee retained on every trade (2%)
pub const DEFAULT_FEE_RATE: f64 = 0.02;

/// Default display bounds for outcome prices
pub const DEFAULT_MIN_PRICE: f64 = 0.01;
pub const DEFAULT_MAX_PRICE: f64 = 0.99;

/// Business-risk tuning for trade math and state validation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskThresholds {
    /// Largest fraction of an outcome's reserve a single buy may take
    pub max_buy_fraction: f64,
    /// Relative k drift after a buy that triggers uniform reserve scaling
    pub k_rebalance_tolerance: f64,
    /// Relative k drift tolerated by validation before a warning
    pub k_validation_tolerance: f64,
    /// Allowed distance of the price sum from 1
    pub price_sum_tolerance: f64,
    /// Lowest value a reserve may be drawn down to by a sell payout
    pub min_reserve_floor: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            max_buy_fraction: 0.95,
            k_rebalance_tolerance: 0.01,
            k_validation_tolerance: 0.10,
            price_sum_tolerance: 0.01,
            min_reserve_floor: 0.01,
        }
    }
}

/// Immutable configuration for an [`AmmCalculator`](crate::AmmCalculator)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmmConfig {
    /// Fraction of trade notional kept as a fee, in `[0, 1)`
    pub fee_rate: f64,
    /// Lower bound for displayed prices (not applied to trade math)
    pub min_price: f64,
    /// Upper bound for displayed prices (not applied to trade math)
    pub max_price: f64,
    /// Fallback invariant target for snapshots without a usable `kConstant`
    pub k_constant: Option<f64>,
    pub thresholds: RiskThresholds,
}

impl Default for AmmConfig {
    fn default() -> Self {
        Self {
            fee_rate: DEFAULT_FEE_RATE,
            min_price: DEFAULT_MIN_PRICE,
            max_price: DEFAULT_MAX_PRICE,
            k_constant: None,
            thresholds: RiskThresholds::default(),
        }
    }
}

impl AmmConfig {
    /// Configuration with the given fee rate and default everything else
    pub fn with_fee_rate(fee_rate: f64) -> Self {
        Self {
            fee_rate,
            ..Self::default()
        }
    }

    /// Check every field is in range
    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.fee_rate) {
            return Err(invalid(format!(
                "fee_rate must be in [0, 1), got {}",
                self.fee_rate
            )));
        }
        if !(self.min_price.is_finite() && self.max_price.is_finite())
            || self.min_price < 0.0
            || self.max_price > 1.0
            || self.min_price >= self.max_price
        {
            return Err(invalid(format!(
                "price bounds must satisfy 0 <= min < max <= 1, got [{}, {}]",
                self.min_price, self.max_price
            )));
        }
        if let Some(k) = self.k_constant {
            if !(k.is_finite() && k > 0.0) {
                return Err(invalid(format!("k_constant must be positive, got {}", k)));
            }
        }

        let t = &self.thresholds;
        if !(t.max_buy_fraction > 0.0 && t.max_buy_fraction < 1.0) {
            return Err(invalid(format!(
                "max_buy_fraction must be in (0, 1), got {}",
                t.max_buy_fraction
            )));
        }
        for (name, value) in [
            ("k_rebalance_tolerance", t.k_rebalance_tolerance),
            ("k_validation_tolerance", t.k_validation_tolerance),
            ("price_sum_tolerance", t.price_sum_tolerance),
            ("min_reserve_floor", t.min_reserve_floor),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(invalid(format!("{} must be positive, got {}", name, value)));
            }
        }

        Ok(())
    }

    /// Clamp a price into the configured display range
    pub fn clamp_display_price(&self, price: f64) -> f64 {
        price.clamp(self.min_price, self.max_price)
    }
}

fn invalid(reason: String) -> AmmError {
    AmmError::InvalidConfig { reason }
}
