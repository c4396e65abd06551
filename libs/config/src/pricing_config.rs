//! Pricing Configuration Module
//!
//! Loads fee schedules for the pricing engine from TOML files with
//! environment-specific overlays and `AMM_` environment variable overrides.

use anyhow::{Context, Result};
use config_crate::{Config, Environment, File, FileFormat};
use outcome_amm::{AmmCalculator, AmmConfig, RiskThresholds};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Default location of the base pricing file
pub const DEFAULT_CONFIG_PATH: &str = "config/pricing.toml";

/// Prefix for environment variable overrides (`AMM_DEFAULTS__FEE_RATE=0.01`)
pub const ENV_PREFIX: &str = "AMM";

/// Complete pricing configuration: global defaults plus per-market overrides
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct PricingSettings {
    /// Configuration applied to every market
    #[serde(default)]
    pub defaults: AmmConfig,

    /// Market-specific overrides keyed by market id
    #[serde(default)]
    pub markets: HashMap<String, MarketOverride>,
}

/// Per-market settings; unset fields inherit from `defaults`
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct MarketOverride {
    pub fee_rate: Option<f64>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub k_constant: Option<f64>,
    pub thresholds: Option<ThresholdOverride>,
    pub description: Option<String>,
}

/// Partial risk thresholds for a single market
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct ThresholdOverride {
    pub max_buy_fraction: Option<f64>,
    pub k_rebalance_tolerance: Option<f64>,
    pub k_validation_tolerance: Option<f64>,
    pub price_sum_tolerance: Option<f64>,
    pub min_reserve_floor: Option<f64>,
}

impl ThresholdOverride {
    fn apply(&self, base: RiskThresholds) -> RiskThresholds {
        RiskThresholds {
            max_buy_fraction: self.max_buy_fraction.unwrap_or(base.max_buy_fraction),
            k_rebalance_tolerance: self
                .k_rebalance_tolerance
                .unwrap_or(base.k_rebalance_tolerance),
            k_validation_tolerance: self
                .k_validation_tolerance
                .unwrap_or(base.k_validation_tolerance),
            price_sum_tolerance: self.price_sum_tolerance.unwrap_or(base.price_sum_tolerance),
            min_reserve_floor: self.min_reserve_floor.unwrap_or(base.min_reserve_floor),
        }
    }
}

impl MarketOverride {
    fn apply(&self, base: &AmmConfig) -> AmmConfig {
        AmmConfig {
            fee_rate: self.fee_rate.unwrap_or(base.fee_rate),
            min_price: self.min_price.unwrap_or(base.min_price),
            max_price: self.max_price.unwrap_or(base.max_price),
            k_constant: self.k_constant.or(base.k_constant),
            thresholds: self
                .thresholds
                .as_ref()
                .map(|t| t.apply(base.thresholds))
                .unwrap_or(base.thresholds),
        }
    }
}

impl PricingSettings {
    /// Load configuration from files with environment overrides
    ///
    /// The environment overlay is read from `environments/<env>.toml` next
    /// to the base file.
    pub fn load(base_path: Option<&Path>, environment: Option<&str>) -> Result<Self> {
        let base = base_path.unwrap_or(Path::new(DEFAULT_CONFIG_PATH));

        let mut builder = Config::builder().add_source(File::from(base).required(true));

        if let Some(env) = environment {
            let env_file = base
                .parent()
                .unwrap_or(Path::new("."))
                .join("environments")
                .join(format!("{}.toml", env));

            if env_file.exists() {
                info!("Loading pricing environment config: {:?}", env_file);
                builder = builder.add_source(File::from(env_file));
            } else {
                warn!("Pricing environment config not found: {:?}", env_file);
            }
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .context("Failed to build pricing configuration")?;

        let settings: Self = config
            .try_deserialize()
            .context("Failed to deserialize pricing configuration")?;

        debug!(
            markets = settings.markets.len(),
            fee_rate = settings.defaults.fee_rate,
            "Loaded pricing configuration from {:?}",
            base
        );
        Ok(settings)
    }

    /// Parse settings from an in-memory TOML document (no env overrides)
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Config::builder()
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()
            .context("Failed to parse pricing configuration")?
            .try_deserialize()
            .context("Failed to deserialize pricing configuration")
    }

    /// Effective configuration for a market
    pub fn config_for(&self, market_id: Option<&str>) -> AmmConfig {
        match market_id.and_then(|id| self.markets.get(id)) {
            Some(overrides) => overrides.apply(&self.defaults),
            None => self.defaults.clone(),
        }
    }

    /// Validated calculator for a market's fee schedule
    pub fn calculator_for(&self, market_id: Option<&str>) -> Result<AmmCalculator> {
        let config = self.config_for(market_id);
        AmmCalculator::new(config).with_context(|| {
            format!(
                "Invalid pricing configuration for market {}",
                market_id.unwrap_or("<default>")
            )
        })
    }

    /// Check the defaults and every market's effective configuration
    pub fn validate(&self) -> Result<()> {
        self.defaults
            .validate()
            .context("Invalid default pricing configuration")?;

        for market_id in self.markets.keys() {
            self.config_for(Some(market_id))
                .validate()
                .with_context(|| format!("Invalid pricing configuration for market {}", market_id))?;
        }
        Ok(())
    }

    /// Effective configuration for a market rendered as TOML
    pub fn render_effective(&self, market_id: Option<&str>) -> Result<String> {
        toml::to_string_pretty(&self.config_for(market_id))
            .context("Failed to render pricing configuration")
    }
}

/// Load and validate settings, expanding `~` and `$VARS` in the path
pub fn load_settings(path: Option<&str>, environment: Option<&str>) -> Result<PricingSettings> {
    let settings = match path {
        Some(raw) => {
            let expanded = shellexpand::full(raw).context("Failed to expand config path")?;
            let path = PathBuf::from(expanded.into_owned());
            PricingSettings::load(Some(&path), environment)?
        }
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
            PricingSettings::load(None, environment)?
        }
        None => {
            info!("No pricing config found, using built-in defaults");
            PricingSettings::default()
        }
    };

    settings.validate()?;
    Ok(settings)
}
