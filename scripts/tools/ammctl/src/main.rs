use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use outcome_amm::{TradeAction, DEFAULT_LIQUIDITY};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod commands;
mod snapshot;

#[derive(Parser)]
#[command(name = "ammctl")]
#[command(about = "Price trades and maintain outcome market snapshots")]
#[command(version)]
struct Cli {
    /// Pricing configuration file (defaults to config/pricing.toml when present)
    #[arg(long, global = true)]
    config: Option<String>,
    /// Environment overlay to apply (config/environments/<env>.toml)
    #[arg(long, global = true)]
    env: Option<String>,
    /// Market id used to select a fee schedule override
    #[arg(long, global = true)]
    market_id: Option<String>,
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Seed a new market with equal reserves
    Init {
        /// Comma-separated outcome ids
        #[arg(long, value_delimiter = ',', required = true)]
        outcomes: Vec<String>,
        /// Total dollar liquidity
        #[arg(long, default_value_t = DEFAULT_LIQUIDITY)]
        liquidity: f64,
        /// Write the snapshot here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show prices implied by a snapshot's reserves
    Prices {
        /// Snapshot file, or - for stdin
        #[arg(long)]
        market: String,
    },
    /// Preview a trade without pool deltas
    Quote(TradeArgs),
    /// Price a trade and print the next snapshot
    Trade {
        #[command(flatten)]
        trade: TradeArgs,
        /// Write the next snapshot here
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Check snapshot invariants; exits non-zero when invalid
    Validate {
        #[arg(long)]
        market: String,
    },
    /// Snap reserves back to current prices
    Rebalance {
        #[arg(long)]
        market: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the effective pricing configuration
    Config,
}

#[derive(Args)]
struct TradeArgs {
    /// Snapshot file, or - for stdin
    #[arg(long)]
    market: String,
    /// Outcome to trade
    #[arg(long)]
    outcome: String,
    /// buy or sell
    #[arg(long)]
    action: TradeAction,
    /// Dollars for buys, shares for sells
    #[arg(long)]
    amount: f64,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let settings = amm_config::load_settings(cli.config.as_deref(), cli.env.as_deref())?;
    let market_id = cli.market_id.as_deref();
    let calculator = settings.calculator_for(market_id)?;
    debug!(
        fee_rate = calculator.config().fee_rate,
        market_id = market_id.unwrap_or("<default>"),
        "Using pricing configuration"
    );

    let output = commands::execute(cli.command, &calculator, &settings, market_id)?;
    println!("{}", output.body);

    Ok(if output.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    })
}
