//! Security thresholds for the pre-trade validators.
//!
//! Thresholds are loaded once with the rest of the configuration and handed to
//! the validators by value; nothing mutates them afterwards.

use serde::Deserialize;

use crate::error::ConfigError;

/// Thresholds for every validator domain.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ThresholdsConfig {
    #[serde(default)]
    pub options: OptionThresholds,
    #[serde(default)]
    pub futures: FuturesThresholds,
    #[serde(default)]
    pub flash_loan: FlashLoanThresholds,
}

impl ThresholdsConfig {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        self.options.validate()?;
        self.futures.validate()?;
        self.flash_loan.validate()
    }
}

/// Options trade limits.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OptionThresholds {
    /// Relative strike/spot distance above which a trade is flagged.
    pub max_strike_deviation: f64,
    pub min_implied_volatility: f64,
    pub max_implied_volatility: f64,
    /// Volatility above which a trade is flagged but still allowed.
    pub high_implied_volatility: f64,
    pub min_time_to_expiry_secs: f64,
    pub max_time_to_expiry_secs: f64,
    /// Position notional over pool liquidity that rejects a trade.
    pub max_position_ratio: f64,
    /// Position notional over pool liquidity that flags a trade.
    pub warn_position_ratio: f64,
    pub min_liquidity_usd: f64,
    /// Current/oracle deviation treated as manipulation.
    pub oracle_deviation_limit: f64,
    /// Current/recent-mean deviation treated as manipulation.
    pub recent_price_deviation_limit: f64,
}

impl Default for OptionThresholds {
    fn default() -> Self {
        Self {
            max_strike_deviation: 0.5,
            min_implied_volatility: 0.1,
            max_implied_volatility: 5.0,
            high_implied_volatility: 2.0,
            min_time_to_expiry_secs: 3_600.0,
            max_time_to_expiry_secs: 31_536_000.0,
            max_position_ratio: 0.10,
            warn_position_ratio: 0.05,
            min_liquidity_usd: 100_000.0,
            oracle_deviation_limit: 0.15,
            recent_price_deviation_limit: 0.20,
        }
    }
}

/// Reject zero, negative and non-finite values.
fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            field,
            reason: format!("must be a finite number greater than 0, got {value}"),
        })
    }
}

/// Reject negative and non-finite values.
fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            field,
            reason: format!("must be a finite number of at least 0, got {value}"),
        })
    }
}

impl OptionThresholds {
    fn validate(&self) -> Result<(), ConfigError> {
        positive("max_strike_deviation", self.max_strike_deviation)?;
        positive("min_implied_volatility", self.min_implied_volatility)?;
        positive("max_implied_volatility", self.max_implied_volatility)?;
        positive("high_implied_volatility", self.high_implied_volatility)?;
        non_negative("min_time_to_expiry_secs", self.min_time_to_expiry_secs)?;
        positive("max_time_to_expiry_secs", self.max_time_to_expiry_secs)?;
        positive("max_position_ratio", self.max_position_ratio)?;
        positive("warn_position_ratio", self.warn_position_ratio)?;
        non_negative("min_liquidity_usd", self.min_liquidity_usd)?;
        positive("oracle_deviation_limit", self.oracle_deviation_limit)?;
        positive("recent_price_deviation_limit", self.recent_price_deviation_limit)?;

        if self.min_implied_volatility >= self.max_implied_volatility {
            return Err(ConfigError::InvalidValue {
                field: "min_implied_volatility",
                reason: "must be below max_implied_volatility".to_string(),
            });
        }
        if self.min_time_to_expiry_secs >= self.max_time_to_expiry_secs {
            return Err(ConfigError::InvalidValue {
                field: "min_time_to_expiry_secs",
                reason: "must be below max_time_to_expiry_secs".to_string(),
            });
        }
        if self.warn_position_ratio > self.max_position_ratio {
            return Err(ConfigError::InvalidValue {
                field: "warn_position_ratio",
                reason: "must not exceed max_position_ratio".to_string(),
            });
        }
        Ok(())
    }
}

/// Futures trade limits.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FuturesThresholds {
    pub max_leverage: f64,
    /// Leverage above which a trade is flagged.
    pub high_leverage: f64,
    pub max_position_value_usd: f64,
    /// Mark/index deviation that is flagged.
    pub max_price_deviation: f64,
    pub max_price_impact: f64,
    pub warn_price_impact: f64,
    pub maintenance_margin: f64,
    /// Extra margin kept between liquidation and bankruptcy price.
    pub liquidation_buffer: f64,
    /// Fraction of the theoretical leverage ceiling offered as "safe".
    pub safe_leverage_factor: f64,
    /// Funding rates are clamped to `±max_funding_rate`.
    pub max_funding_rate: f64,
    /// Allowed distance between a funding rate and the model rate.
    pub funding_tolerance: f64,
    pub base_interest_rate: f64,
    /// Oracle/mark deviation reported as manipulation.
    pub manipulation_oracle_deviation: f64,
    pub volume_spike_multiplier: f64,
    pub max_volume_spikes: usize,
    pub max_price_reversals: usize,
    /// Mean time between reversals below which reversals look like spoofing.
    pub min_reversal_interval: f64,
}

impl Default for FuturesThresholds {
    fn default() -> Self {
        Self {
            max_leverage: 125.0,
            high_leverage: 50.0,
            max_position_value_usd: 1_000_000.0,
            max_price_deviation: 0.02,
            max_price_impact: 0.05,
            warn_price_impact: 0.01,
            maintenance_margin: 0.005,
            liquidation_buffer: 0.02,
            safe_leverage_factor: 0.8,
            max_funding_rate: 0.01,
            funding_tolerance: 0.005,
            base_interest_rate: 0.0001,
            manipulation_oracle_deviation: 0.05,
            volume_spike_multiplier: 3.0,
            max_volume_spikes: 3,
            max_price_reversals: 5,
            min_reversal_interval: 60.0,
        }
    }
}

impl FuturesThresholds {
    fn validate(&self) -> Result<(), ConfigError> {
        positive("high_leverage", self.high_leverage)?;
        positive("max_price_deviation", self.max_price_deviation)?;
        positive("max_price_impact", self.max_price_impact)?;
        positive("warn_price_impact", self.warn_price_impact)?;
        positive("maintenance_margin", self.maintenance_margin)?;
        positive("liquidation_buffer", self.liquidation_buffer)?;
        positive("funding_tolerance", self.funding_tolerance)?;
        non_negative("base_interest_rate", self.base_interest_rate)?;
        positive("manipulation_oracle_deviation", self.manipulation_oracle_deviation)?;
        positive("volume_spike_multiplier", self.volume_spike_multiplier)?;
        positive("min_reversal_interval", self.min_reversal_interval)?;
        positive("safe_leverage_factor", self.safe_leverage_factor)?;
        if self.safe_leverage_factor > 1.0 {
            return Err(ConfigError::InvalidValue {
                field: "safe_leverage_factor",
                reason: "must be at most 1".to_string(),
            });
        }
        if self.maintenance_margin + self.liquidation_buffer >= 1.0 {
            return Err(ConfigError::InvalidValue {
                field: "maintenance_margin",
                reason: "maintenance_margin plus liquidation_buffer must be below 1".to_string(),
            });
        }
        if !self.max_leverage.is_finite() || self.max_leverage < 1.0 {
            return Err(ConfigError::InvalidValue {
                field: "max_leverage",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.high_leverage > self.max_leverage {
            return Err(ConfigError::InvalidValue {
                field: "high_leverage",
                reason: "must not exceed max_leverage".to_string(),
            });
        }
        if self.warn_price_impact > self.max_price_impact {
            return Err(ConfigError::InvalidValue {
                field: "warn_price_impact",
                reason: "must not exceed max_price_impact".to_string(),
            });
        }
        positive("max_position_value_usd", self.max_position_value_usd)?;
        positive("max_funding_rate", self.max_funding_rate)
    }
}

/// Flash-loan code and economics limits.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FlashLoanThresholds {
    pub max_gas: u64,
    pub max_complexity: u32,
    pub base_gas: u64,
    pub gas_per_external_call: u64,
    pub gas_per_storage_write: u64,
    pub gas_per_loop: u64,
    /// Protocol fee charged on the borrowed amount.
    pub fee_rate: f64,
    pub gas_price_gwei: f64,
    pub eth_price_usd: f64,
    pub min_net_profit_usd: f64,
    /// Target contracts that may never be called.
    pub blacklisted_targets: Vec<String>,
}

/// Addresses rejected regardless of configuration.
pub const ALWAYS_BLACKLISTED: [&str; 2] = [
    "0x0000000000000000000000000000000000000000",
    "0x000000000000000000000000000000000000dead",
];

impl Default for FlashLoanThresholds {
    fn default() -> Self {
        Self {
            max_gas: 8_000_000,
            max_complexity: 10,
            base_gas: 100_000,
            gas_per_external_call: 50_000,
            gas_per_storage_write: 20_000,
            gas_per_loop: 30_000,
            fee_rate: 0.0009,
            gas_price_gwei: 30.0,
            eth_price_usd: 2_000.0,
            min_net_profit_usd: 10.0,
            blacklisted_targets: ALWAYS_BLACKLISTED.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

impl FlashLoanThresholds {
    /// Return `true` if `address` is blacklisted (case-insensitive).
    #[must_use]
    pub fn is_blacklisted(&self, address: &str) -> bool {
        let address = address.to_ascii_lowercase();
        ALWAYS_BLACKLISTED.contains(&address.as_str())
            || self
                .blacklisted_targets
                .iter()
                .any(|t| t.eq_ignore_ascii_case(&address))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_gas == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_gas",
                reason: "must be greater than 0".to_string(),
            });
        }
        positive("gas_price_gwei", self.gas_price_gwei)?;
        positive("eth_price_usd", self.eth_price_usd)?;
        non_negative("min_net_profit_usd", self.min_net_profit_usd)?;
        if !(0.0..1.0).contains(&self.fee_rate) {
            return Err(ConfigError::InvalidValue {
                field: "fee_rate",
                reason: "must be between 0 and 1".to_string(),
            });
        }
        Ok(())
    }
}
