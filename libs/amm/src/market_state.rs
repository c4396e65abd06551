//! Liquidity pool snapshot for a single prediction market
//!
//! Outcomes are kept in a `BTreeMap` so iteration order, and therefore every
//! derived price or reserve map, is deterministic for a given snapshot.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Pool position of one possible result of the market (e.g. "home_win")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeState {
    /// Shares issued against this outcome
    pub shares: f64,
    /// Pool reserve balance; the higher the reserve, the lower the price
    pub reserve: f64,
    /// Normalized price in (0, 1)
    pub current_price: f64,
}

/// Snapshot of a market's liquidity pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketState {
    pub outcomes: BTreeMap<String, OutcomeState>,
    /// Dollar liquidity originally seeded into the pool
    pub total_liquidity: f64,
    /// Product of all reserves the pool is meant to hold
    pub k_constant: f64,
}

impl MarketState {
    pub fn outcome(&self, outcome_id: &str) -> Option<&OutcomeState> {
        self.outcomes.get(outcome_id)
    }

    pub fn outcome_count(&self) -> usize {
        self.outcomes.len()
    }

    pub fn outcome_ids(&self) -> impl Iterator<Item = &str> {
        self.outcomes.keys().map(String::as_str)
    }

    /// Current reserves keyed by outcome
    pub fn reserves(&self) -> BTreeMap<String, f64> {
        self.outcomes
            .iter()
            .map(|(id, o)| (id.clone(), o.reserve))
            .collect()
    }

    /// Current issued shares keyed by outcome
    pub fn shares(&self) -> BTreeMap<String, f64> {
        self.outcomes
            .iter()
            .map(|(id, o)| (id.clone(), o.shares))
            .collect()
    }

    /// Stored prices keyed by outcome
    pub fn prices(&self) -> BTreeMap<String, f64> {
        self.outcomes
            .iter()
            .map(|(id, o)| (id.clone(), o.current_price))
            .collect()
    }

    /// Product of all reserves (the live value of k)
    pub fn reserve_product(&self) -> f64 {
        self.outcomes.values().map(|o| o.reserve).product()
    }

    pub fn reserve_sum(&self) -> f64 {
        self.outcomes.values().map(|o| o.reserve).sum()
    }

    pub fn price_sum(&self) -> f64 {
        self.outcomes.values().map(|o| o.current_price).sum()
    }
}
