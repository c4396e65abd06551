//! Error types for market pricing operations
//!
//! Distinguishes caller mistakes (unknown outcome, overselling) from pool
//! corruption so the API layer can map them to client or internal failures.

use thiserror::Error;

/// Result alias used across the pricing engine
pub type Result<T> = std::result::Result<T, AmmError>;

/// Errors produced by the AMM calculator
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AmmError {
    /// Referenced outcome is not part of the market
    #[error("Outcome '{outcome_id}' not found in market")]
    OutcomeNotFound { outcome_id: String },

    /// Intermediate math went non-positive or non-finite
    #[error("Invalid pool state: {reason}")]
    InvalidPoolState { reason: String },

    /// Sell request exceeds issued shares
    #[error("Insufficient shares for '{outcome_id}': requested {requested}, available {available}")]
    InsufficientShares {
        outcome_id: String,
        requested: f64,
        available: f64,
    },

    /// Preview aborted because the snapshot violates pool invariants
    #[error("Market state failed validation; rebalance required")]
    InvalidMarketState,

    /// Market has no outcomes at all
    #[error("Market has no outcomes")]
    NoOutcomes,

    /// Multi-outcome pricing needs at least two outcomes
    #[error("Market needs at least 2 outcomes, got {count}")]
    TooFewOutcomes { count: usize },

    /// Outcome identifiers must be unique
    #[error("Duplicate outcome identifier '{outcome_id}'")]
    DuplicateOutcome { outcome_id: String },

    /// Seed liquidity must be positive and finite
    #[error("Invalid liquidity amount: {amount}")]
    InvalidLiquidity { amount: f64 },

    /// Trade amount must be positive and finite
    #[error("Invalid trade amount: {amount}")]
    InvalidAmount { amount: f64 },

    /// Calculator configuration out of range
    #[error("Invalid calculator configuration: {reason}")]
    InvalidConfig { reason: String },

    /// Value cannot be represented for the ledger
    #[error("Value is not finite: {field} = {value}")]
    NonFiniteValue { field: &'static str, value: f64 },
}

impl AmmError {
    /// True for errors caused by the request rather than the stored market.
    ///
    /// The API layer reports these as client errors; everything else signals
    /// a data-integrity or configuration problem upstream.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            AmmError::OutcomeNotFound { .. }
                | AmmError::InsufficientShares { .. }
                | AmmError::InvalidAmount { .. }
                | AmmError::TooFewOutcomes { .. }
                | AmmError::DuplicateOutcome { .. }
                | AmmError::InvalidLiquidity { .. }
        )
    }

    pub(crate) fn pool(reason: impl Into<String>) -> Self {
        AmmError::InvalidPoolState {
            reason: reason.into(),
        }
    }
}
