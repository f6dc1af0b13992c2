//! Command-line interface definitions.
//!
//! Defines the CLI structure for the xpguard binary using `clap`. The CLI
//! runs the pre-trade validators against ad-hoc inputs, validates
//! configuration files, and inspects the configured cache.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::domain::{FundingContext, FuturesTrade, Greeks, OptionTrade};

/// Pre-trade risk validation and cache tooling for XPSwap
#[derive(Parser, Debug)]
#[command(name = "xpguard")]
#[command(version)]
pub struct Cli {
    /// Color output mode [auto, always, never]
    #[arg(
        long,
        global = true,
        default_value = "auto",
        hide_possible_values = true
    )]
    pub color: ColorChoice,

    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Decrease output verbosity
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the configuration file (defaults apply if it is missing)
    #[arg(short, long, global = true, default_value = "config.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

/// Color output mode for terminal rendering.
#[derive(Clone, Debug, Default, clap::ValueEnum)]
pub enum ColorChoice {
    /// Detect automatically
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a pre-trade validator
    #[command(subcommand)]
    Check(CheckCommand),

    /// Manage configuration
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Inspect the configured cache
    #[command(subcommand)]
    Cache(CacheCommand),
}

/// Subcommands for `xpguard check`.
///
/// Each command exits with status 2 when the validator rejects its input.
#[derive(Subcommand, Debug)]
pub enum CheckCommand {
    /// Validate an options trade.
    Option(OptionArgs),
    /// Validate a leveraged futures position.
    Futures(FuturesArgs),
    /// Validate flash-loan contract code and economics.
    FlashLoan(FlashLoanArgs),
    /// Validate a flash-loan target contract and function selector.
    Target(TargetArgs),
    /// Check option Greeks for sanity.
    Greeks(GreeksArgs),
    /// Validate a funding rate against the model rate.
    Funding(FundingArgs),
}

/// Subcommands for `xpguard config`.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Validate the configuration file.
    Validate,
    /// Display the effective configuration with defaults applied.
    Show,
}

/// Subcommands for `xpguard cache`.
#[derive(Subcommand, Debug)]
pub enum CacheCommand {
    /// Build the configured cache and print its statistics.
    Stats,
}

/// Arguments for `check option`.
#[derive(Args, Debug)]
pub struct OptionArgs {
    #[arg(long)]
    pub strike: f64,
    #[arg(long)]
    pub spot: f64,
    /// Implied volatility as a fraction (0.3 = 30%).
    #[arg(long)]
    pub iv: f64,
    /// Seconds until expiry.
    #[arg(long)]
    pub expiry: f64,
    #[arg(long, default_value = "1")]
    pub quantity: f64,
    /// Pool liquidity in USD.
    #[arg(long)]
    pub liquidity: f64,
}

impl OptionArgs {
    #[must_use]
    pub const fn trade(&self) -> OptionTrade {
        OptionTrade {
            strike_price: self.strike,
            spot_price: self.spot,
            implied_volatility: self.iv,
            time_to_expiry: self.expiry,
            quantity: self.quantity,
            total_liquidity: self.liquidity,
        }
    }
}

/// Arguments for `check futures`.
#[derive(Args, Debug)]
pub struct FuturesArgs {
    #[arg(long)]
    pub leverage: f64,
    /// Signed position size: negative for a short.
    #[arg(long, allow_negative_numbers = true)]
    pub size: f64,
    #[arg(long)]
    pub balance: f64,
    #[arg(long)]
    pub mark: f64,
    /// Index price. Defaults to the mark price.
    #[arg(long)]
    pub index: Option<f64>,
    /// Order book depth in contracts.
    #[arg(long)]
    pub depth: f64,
}

impl FuturesArgs {
    #[must_use]
    pub fn trade(&self) -> FuturesTrade {
        FuturesTrade {
            leverage: self.leverage,
            position_size: self.size,
            account_balance: self.balance,
            mark_price: self.mark,
            index_price: self.index.unwrap_or(self.mark),
            liquidity_depth: self.depth,
        }
    }
}

/// Arguments for `check flash-loan`.
#[derive(Args, Debug)]
pub struct FlashLoanArgs {
    /// Path to the contract source, or `-` for stdin.
    #[arg(long)]
    pub code: PathBuf,
    /// arbitrage, liquidation, collateral_swap or debt_refinancing.
    #[arg(long)]
    pub strategy: String,
    /// Borrowed amount in USD.
    #[arg(long)]
    pub loan: f64,
    /// Expected gross profit in USD.
    #[arg(long, allow_negative_numbers = true)]
    pub profit: f64,
}

/// Arguments for `check target`.
#[derive(Args, Debug)]
pub struct TargetArgs {
    /// Contract address (0x + 40 hex characters).
    pub address: String,
    /// Function selector (0x + 8 hex characters).
    pub selector: String,
}

/// Arguments for `check greeks`.
#[derive(Args, Debug)]
pub struct GreeksArgs {
    #[arg(long, allow_negative_numbers = true)]
    pub delta: f64,
    #[arg(long, allow_negative_numbers = true)]
    pub gamma: f64,
    #[arg(long, allow_negative_numbers = true, default_value = "0")]
    pub theta: f64,
    #[arg(long, allow_negative_numbers = true)]
    pub vega: f64,
    #[arg(long, allow_negative_numbers = true, default_value = "0")]
    pub rho: f64,
}

impl GreeksArgs {
    #[must_use]
    pub const fn greeks(&self) -> Greeks {
        Greeks {
            delta: self.delta,
            gamma: self.gamma,
            theta: self.theta,
            vega: self.vega,
            rho: self.rho,
        }
    }
}

/// Arguments for `check funding`.
#[derive(Args, Debug)]
pub struct FundingArgs {
    /// Proposed funding rate per interval.
    #[arg(long, allow_negative_numbers = true)]
    pub rate: f64,
    #[arg(long, default_value = "0")]
    pub volatility: f64,
    /// Open interest relative to its recent average.
    #[arg(long, default_value = "1")]
    pub oi_ratio: f64,
    #[arg(long, allow_negative_numbers = true, default_value = "0")]
    pub premium: f64,
}

impl FundingArgs {
    #[must_use]
    pub const fn context(&self) -> FundingContext {
        FundingContext {
            volatility: self.volatility,
            open_interest_ratio: self.oi_ratio,
            premium_index: self.premium,
        }
    }
}
