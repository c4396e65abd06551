//! Subcommand execution over market snapshots

use crate::snapshot::{read_market, render, write_json};
use crate::{Commands, TradeArgs};
use amm_config::PricingSettings;
use anyhow::{Context, Result};
use outcome_amm::{AmmCalculator, TradeAction};
use serde_json::json;
use tracing::{info, warn};

/// Rendered command output and whether the command succeeded
pub struct CommandOutput {
    pub body: String,
    pub success: bool,
}

impl CommandOutput {
    fn ok(body: String) -> Self {
        Self {
            body,
            success: true,
        }
    }
}

pub fn execute(
    command: Commands,
    calculator: &AmmCalculator,
    settings: &PricingSettings,
    market_id: Option<&str>,
) -> Result<CommandOutput> {
    match command {
        Commands::Init {
            outcomes,
            liquidity,
            output,
        } => {
            let market = calculator
                .initialize_market(&outcomes, liquidity)
                .context("Failed to initialize market")?;
            info!(
                outcomes = outcomes.len(),
                liquidity, "Initialized market snapshot"
            );
            match output {
                Some(path) => {
                    write_json(&market, &path)?;
                    Ok(CommandOutput::ok(format!("Wrote market snapshot to {:?}", path)))
                }
                None => Ok(CommandOutput::ok(render(&market)?)),
            }
        }
        Commands::Prices { market } => {
            let market = read_market(&market)?;
            let prices = calculator.calculate_current_prices(&market)?;
            let display: serde_json::Map<String, serde_json::Value> = prices
                .iter()
                .map(|(id, p)| {
                    (
                        id.clone(),
                        json!({
                            "price": p,
                            "displayPrice": calculator.config().clamp_display_price(*p),
                        }),
                    )
                })
                .collect();
            Ok(CommandOutput::ok(render(&display)?))
        }
        Commands::Quote(args) => {
            let market = read_market(&args.market)?;
            let estimate = calculator
                .estimate_trade(&market, &args.outcome, args.action, args.amount)
                .with_context(|| describe(&args))?;
            Ok(CommandOutput::ok(render(&estimate)?))
        }
        Commands::Trade { trade, output } => {
            let market = read_market(&trade.market)?;
            if !calculator.validate_market_state(&market) {
                warn!("Pricing against a snapshot that failed validation");
            }
            let result = match trade.action {
                TradeAction::Buy => calculator.calculate_buy(&market, &trade.outcome, trade.amount),
                TradeAction::Sell => {
                    calculator.calculate_sell(&market, &trade.outcome, trade.amount)
                }
            }
            .with_context(|| describe(&trade))?;
            let next = result.apply_to(&market);
            let ledger = result.ledger_entry()?;

            if let Some(path) = &output {
                write_json(&next, path)?;
            }
            let body = render(&json!({
                "trade": result,
                "ledger": ledger,
                "market": next,
            }))?;
            Ok(CommandOutput::ok(body))
        }
        Commands::Validate { market } => {
            let market = read_market(&market)?;
            let valid = calculator.validate_market_state(&market);
            let health = calculator.inspect_market_state(&market);
            let body = render(&json!({
                "valid": valid,
                "needsRebalance": health.needs_rebalance(),
                "health": health,
            }))?;
            Ok(CommandOutput {
                body,
                success: valid,
            })
        }
        Commands::Rebalance { market, output } => {
            let market = read_market(&market)?;
            let rebalanced = calculator
                .rebalance_market(&market)
                .context("Failed to rebalance market")?;
            info!(
                previous_k = market.k_constant,
                k_constant = rebalanced.k_constant,
                "Rebalanced market snapshot"
            );
            match output {
                Some(path) => {
                    write_json(&rebalanced, &path)?;
                    Ok(CommandOutput::ok(format!("Wrote rebalanced snapshot to {:?}", path)))
                }
                None => Ok(CommandOutput::ok(render(&rebalanced)?)),
            }
        }
        Commands::Config => Ok(CommandOutput::ok(settings.render_effective(market_id)?)),
    }
}

fn describe(args: &TradeArgs) -> String {
    format!(
        "Failed to price {} of {} on '{}'",
        args.action, args.amount, args.outcome
    )
}
