//! Options trade validation.

use tracing::debug;

use super::manipulation;
use crate::domain::{Greeks, OptionTrade, RiskReport, ValidationResult};
use crate::infrastructure::config::thresholds::OptionThresholds;

const STRIKE_DEVIATION_WEIGHT: u32 = 20;
const HIGH_VOLATILITY_WEIGHT: u32 = 30;
const POSITION_SIZE_WEIGHT: u32 = 15;
const LOW_LIQUIDITY_WEIGHT: u32 = 25;

/// Validates options trades against [`OptionThresholds`].
#[derive(Debug, Clone, Default)]
pub struct OptionValidator {
    thresholds: OptionThresholds,
}

impl OptionValidator {
    #[must_use]
    pub const fn new(thresholds: OptionThresholds) -> Self {
        Self { thresholds }
    }

    #[must_use]
    pub const fn thresholds(&self) -> &OptionThresholds {
        &self.thresholds
    }

    /// Validate an options trade.
    ///
    /// Every rule runs; a rule that would divide by a non-positive input is
    /// skipped after that input is reported as an error. Non-finite inputs
    /// are reported and no rule runs.
    #[must_use]
    pub fn validate_option_trade(&self, trade: &OptionTrade) -> ValidationResult {
        let t = &self.thresholds;
        let mut report = RiskReport::new();

        if !report.require_finite(&[
            ("Strike price", trade.strike_price),
            ("Spot price", trade.spot_price),
            ("Implied volatility", trade.implied_volatility),
            ("Time to expiry", trade.time_to_expiry),
            ("Quantity", trade.quantity),
            ("Total liquidity", trade.total_liquidity),
        ]) {
            return report.finish();
        }

        if trade.spot_price <= 0.0 {
            report.error(format!("Spot price must be positive: {}", trade.spot_price));
        } else {
            let deviation = (trade.strike_price - trade.spot_price).abs() / trade.spot_price;
            if deviation > t.max_strike_deviation {
                report.warn(
                    format!(
                        "Strike price is far from spot price: {:.1}% deviation",
                        deviation * 100.0
                    ),
                    STRIKE_DEVIATION_WEIGHT,
                );
            }
        }

        let iv = trade.implied_volatility;
        if iv < t.min_implied_volatility || iv > t.max_implied_volatility {
            report.error(format!(
                "Implied volatility out of range: {iv} (allowed {} to {})",
                t.min_implied_volatility, t.max_implied_volatility
            ));
        } else if iv > t.high_implied_volatility {
            report.warn(
                format!("High implied volatility: {iv}"),
                HIGH_VOLATILITY_WEIGHT,
            );
        }

        if trade.time_to_expiry < t.min_time_to_expiry_secs {
            report.error(format!(
                "Time to expiry too short: {}s (minimum {}s)",
                trade.time_to_expiry, t.min_time_to_expiry_secs
            ));
        } else if trade.time_to_expiry > t.max_time_to_expiry_secs {
            report.error(format!(
                "Time to expiry too long: {}s (maximum {}s)",
                trade.time_to_expiry, t.max_time_to_expiry_secs
            ));
        }

        if trade.quantity <= 0.0 {
            report.error(format!("Quantity must be positive: {}", trade.quantity));
        }

        if trade.total_liquidity <= 0.0 {
            report.error(format!(
                "Total liquidity must be positive: {}",
                trade.total_liquidity
            ));
        } else {
            let position_ratio = trade.quantity * trade.spot_price / trade.total_liquidity;
            if position_ratio > t.max_position_ratio {
                report.error(format!(
                    "Position too large: {:.2}% of total liquidity (maximum {:.2}%)",
                    position_ratio * 100.0,
                    t.max_position_ratio * 100.0
                ));
            } else if position_ratio > t.warn_position_ratio {
                report.warn(
                    format!(
                        "Large position: {:.2}% of total liquidity",
                        position_ratio * 100.0
                    ),
                    POSITION_SIZE_WEIGHT,
                );
            }
        }

        if trade.total_liquidity < t.min_liquidity_usd {
            report.warn(
                format!(
                    "Low liquidity: ${:.2} (recommended at least ${:.2})",
                    trade.total_liquidity, t.min_liquidity_usd
                ),
                LOW_LIQUIDITY_WEIGHT,
            );
        }

        let result = report.finish();
        debug!(
            valid = result.is_valid,
            risk_score = result.risk_score,
            errors = result.errors.len(),
            warnings = result.warnings.len(),
            "Option trade validated"
        );
        result
    }

    /// Return `true` if `current` deviates from the oracle price or from the
    /// mean of `recent` prices beyond the configured limits.
    #[must_use]
    pub fn detect_price_manipulation(&self, current: f64, oracle: f64, recent: &[f64]) -> bool {
        let flagged = manipulation::detect_price_manipulation(
            current,
            oracle,
            recent,
            self.thresholds.oracle_deviation_limit,
            self.thresholds.recent_price_deviation_limit,
        );
        if flagged {
            debug!(current, oracle, samples = recent.len(), "Option price manipulation suspected");
        }
        flagged
    }
}

/// Check that option greeks are internally consistent.
///
/// Bounds `|delta| <= 1`, `gamma >= 0` and `vega >= 0`. Theta and rho are
/// accepted as-is. NaN fails every bounded check.
#[must_use]
pub fn validate_greeks(greeks: &Greeks) -> bool {
    greeks.delta.abs() <= 1.0 && greeks.gamma >= 0.0 && greeks.vega >= 0.0
}
