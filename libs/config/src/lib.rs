//! # Outcome Market Pricing Configuration
//!
//! Centralized fee schedule and risk-threshold configuration for the
//! prediction market pricing engine.
//!
//! ## Features
//!
//! - **Global Defaults**: one `[defaults]` table applied to every market
//! - **Per-Market Overrides**: `[markets.<id>]` tables, unset fields inherit
//! - **Layering**: base file, `environments/<env>.toml` overlay, `AMM_*` env vars
//!
//! ## Usage
//!
//! ```rust,no_run
//! use amm_config::load_settings;
//!
//! let settings = load_settings(Some("config/pricing.toml"), Some("production")).unwrap();
//! let calculator = settings.calculator_for(Some("cup_final")).unwrap();
//! assert!(calculator.config().fee_rate < 1.0);
//! ```

pub mod pricing_config;

// Re-export commonly used types
pub use pricing_config::{
    load_settings, MarketOverride, PricingSettings, ThresholdOverride, DEFAULT_CONFIG_PATH,
    ENV_PREFIX,
};
