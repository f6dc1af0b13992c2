//! Trade request shapes consumed by the validators.
//!
//! All fields are plain `f64` values already fetched by the caller; the
//! validators never perform I/O. Field names deserialize from camelCase so
//! request bodies from the HTTP layer map onto these types directly.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Parameters of an options trade.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionTrade {
    pub strike_price: f64,
    pub spot_price: f64,
    pub implied_volatility: f64,
    /// Seconds until expiry.
    pub time_to_expiry: f64,
    pub quantity: f64,
    /// Pool liquidity in USD.
    pub total_liquidity: f64,
}

/// Option sensitivities as reported by a pricing model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Greeks {
    pub delta: f64,
    pub gamma: f64,
    pub theta: f64,
    pub vega: f64,
    pub rho: f64,
}

/// Parameters of a leveraged futures position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuturesTrade {
    pub leverage: f64,
    /// Signed size: positive is long, negative is short.
    pub position_size: f64,
    pub account_balance: f64,
    pub mark_price: f64,
    pub index_price: f64,
    pub liquidity_depth: f64,
}

impl FuturesTrade {
    /// Direction implied by the sign of `position_size`.
    #[must_use]
    pub fn side(&self) -> PositionSide {
        if self.position_size < 0.0 {
            PositionSide::Short
        } else {
            PositionSide::Long
        }
    }

    /// Notional value in USD.
    #[must_use]
    pub fn position_value(&self) -> f64 {
        self.position_size.abs() * self.mark_price
    }
}

/// Direction of a futures position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionSide {
    Long,
    Short,
}

/// Market inputs to the expected funding rate model.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingContext {
    pub volatility: f64,
    /// Open interest relative to its recent average (1.0 is neutral).
    pub open_interest_ratio: f64,
    pub premium_index: f64,
}

/// A single print in a recent trade window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradeTick {
    pub price: f64,
    pub volume: f64,
    /// Monotonic timestamp in the caller's time unit (seconds by convention).
    pub timestamp: u64,
}

impl TradeTick {
    #[must_use]
    pub const fn new(price: f64, volume: f64, timestamp: u64) -> Self {
        Self {
            price,
            volume,
            timestamp,
        }
    }
}

/// Strategies a flash loan may be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlashLoanStrategy {
    Arbitrage,
    Liquidation,
    CollateralSwap,
    DebtRefinancing,
}

impl FlashLoanStrategy {
    pub const ALL: [FlashLoanStrategy; 4] = [
        FlashLoanStrategy::Arbitrage,
        FlashLoanStrategy::Liquidation,
        FlashLoanStrategy::CollateralSwap,
        FlashLoanStrategy::DebtRefinancing,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            FlashLoanStrategy::Arbitrage => "arbitrage",
            FlashLoanStrategy::Liquidation => "liquidation",
            FlashLoanStrategy::CollateralSwap => "collateral_swap",
            FlashLoanStrategy::DebtRefinancing => "debt_refinancing",
        }
    }
}

impl fmt::Display for FlashLoanStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FlashLoanStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == s)
            .ok_or_else(|| format!("unknown flash loan strategy '{s}'"))
    }
}
