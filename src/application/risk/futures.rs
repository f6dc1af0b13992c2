//! Futures position validation, liquidation math and funding-rate checks.

use serde::Serialize;
use tracing::debug;

use super::manipulation::{ManipulationDetector, ManipulationSignal};
use crate::domain::{
    FundingContext, FuturesTrade, PositionSide, RiskReport, TradeTick, ValidationResult,
};
use crate::infrastructure::config::thresholds::FuturesThresholds;

const HIGH_LEVERAGE_WEIGHT: u32 = 25;
const PRICE_DEVIATION_WEIGHT: u32 = 20;
const PRICE_IMPACT_WEIGHT: u32 = 15;

/// Result of [`FuturesValidator::validate_futures_trade`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FuturesSecurityCheck {
    #[serde(flatten)]
    pub result: ValidationResult,
    pub liquidation_price: f64,
    /// Highest leverage considered safe for this balance and position.
    pub max_leverage: u32,
    /// Required margin as a fraction of the account balance.
    pub margin_ratio: f64,
}

impl FuturesSecurityCheck {
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.result.is_valid
    }
}

/// Result of [`FuturesValidator::validate_funding_rate`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingRateCheck {
    pub is_valid: bool,
    /// Input rate clamped to the configured bound.
    pub adjusted_rate: f64,
    /// Rate predicted by the funding model.
    pub expected_rate: f64,
}

/// Validates futures positions against [`FuturesThresholds`].
#[derive(Debug, Clone, Default)]
pub struct FuturesValidator {
    thresholds: FuturesThresholds,
    detector: ManipulationDetector,
}

impl FuturesValidator {
    #[must_use]
    pub fn new(thresholds: FuturesThresholds) -> Self {
        let detector = ManipulationDetector::new(&thresholds);
        Self {
            thresholds,
            detector,
        }
    }

    #[must_use]
    pub const fn thresholds(&self) -> &FuturesThresholds {
        &self.thresholds
    }

    /// Validate a leveraged position and derive its liquidation price.
    ///
    /// Non-finite inputs are reported without running the rules, and the
    /// derived prices and ratios are NaN.
    #[must_use]
    pub fn validate_futures_trade(&self, trade: &FuturesTrade) -> FuturesSecurityCheck {
        let t = &self.thresholds;
        let mut report = RiskReport::new();

        if !report.require_finite(&[
            ("Leverage", trade.leverage),
            ("Position size", trade.position_size),
            ("Account balance", trade.account_balance),
            ("Mark price", trade.mark_price),
            ("Index price", trade.index_price),
            ("Liquidity depth", trade.liquidity_depth),
        ]) {
            return FuturesSecurityCheck {
                result: report.finish(),
                liquidation_price: f64::NAN,
                max_leverage: 0,
                margin_ratio: f64::NAN,
            };
        }

        if trade.leverage > t.max_leverage {
            report.error(format!(
                "Leverage exceeds maximum: {}x > {}x",
                trade.leverage, t.max_leverage
            ));
        } else if trade.leverage < 1.0 {
            report.error(format!("Leverage must be at least 1x: {}x", trade.leverage));
        } else if trade.leverage > t.high_leverage {
            report.warn(
                format!("High leverage: {}x", trade.leverage),
                HIGH_LEVERAGE_WEIGHT,
            );
        }

        let position_value = trade.position_value();
        if position_value > t.max_position_value_usd {
            report.error(format!(
                "Position value exceeds maximum: ${:.2} > ${:.2}",
                position_value, t.max_position_value_usd
            ));
        }

        let required_margin = if trade.leverage > 0.0 {
            position_value / trade.leverage
        } else {
            position_value
        };
        if required_margin > trade.account_balance {
            report.error(format!(
                "Insufficient balance: required margin ${:.2}, available ${:.2}",
                required_margin, trade.account_balance
            ));
        }

        if trade.index_price > 0.0 {
            let deviation = (trade.mark_price - trade.index_price).abs() / trade.index_price;
            if deviation > t.max_price_deviation {
                report.warn(
                    format!(
                        "Mark price deviates from index: {:.2}%",
                        deviation * 100.0
                    ),
                    PRICE_DEVIATION_WEIGHT,
                );
            }
        } else {
            report.error(format!("Index price must be positive: {}", trade.index_price));
        }

        if trade.liquidity_depth > 0.0 {
            let impact = self.price_impact(trade.position_size, trade.liquidity_depth);
            if impact > t.max_price_impact {
                report.error(format!(
                    "Price impact too high: {:.2}% (maximum {:.2}%)",
                    impact * 100.0,
                    t.max_price_impact * 100.0
                ));
            } else if impact > t.warn_price_impact {
                report.warn(
                    format!("Elevated price impact: {:.2}%", impact * 100.0),
                    PRICE_IMPACT_WEIGHT,
                );
            }
        } else {
            report.error(format!(
                "Liquidity depth must be positive: {}",
                trade.liquidity_depth
            ));
        }

        let margin_ratio = if trade.account_balance > 0.0 {
            required_margin / trade.account_balance
        } else {
            f64::INFINITY
        };

        let check = FuturesSecurityCheck {
            liquidation_price: self.liquidation_price(
                trade.mark_price,
                trade.leverage.max(1.0),
                trade.side(),
            ),
            max_leverage: self.max_safe_leverage(trade.account_balance, position_value),
            margin_ratio,
            result: report.finish(),
        };

        debug!(
            valid = check.result.is_valid,
            risk_score = check.result.risk_score,
            liquidation_price = check.liquidation_price,
            max_leverage = check.max_leverage,
            "Futures trade validated"
        );
        check
    }

    /// Inspect a recent trade window for manipulation patterns.
    #[must_use]
    pub fn detect_manipulation(
        &self,
        window: &[TradeTick],
        oracle_price: f64,
        mark_price: f64,
    ) -> Option<ManipulationSignal> {
        let signal = self.detector.detect(window, oracle_price, mark_price);
        if let Some(signal) = &signal {
            debug!(
                kind = %signal.kind,
                confidence = signal.confidence,
                trades = window.len(),
                "Futures manipulation suspected"
            );
        }
        signal
    }

    /// Fractional price movement caused by taking `size` out of `depth`.
    #[must_use]
    pub fn price_impact(&self, size: f64, depth: f64) -> f64 {
        (size.abs() / depth).powf(1.5)
    }

    /// Liquidation price including maintenance margin and a safety buffer.
    ///
    /// A long liquidates strictly below `entry` and a short strictly above
    /// for any `leverage >= 1`. A long is floored at zero.
    #[must_use]
    pub fn liquidation_price(&self, entry: f64, leverage: f64, side: PositionSide) -> f64 {
        let t = &self.thresholds;
        let distance = 1.0 - 1.0 / leverage + t.maintenance_margin + t.liquidation_buffer;
        match side {
            PositionSide::Long => (entry * (1.0 - distance)).max(0.0),
            PositionSide::Short => entry * (1.0 + distance),
        }
    }

    /// Highest leverage the balance supports with the configured safety factor.
    #[must_use]
    pub fn max_safe_leverage(&self, account_balance: f64, position_value: f64) -> u32 {
        let t = &self.thresholds;
        let cap = t.max_leverage.floor();
        let maintenance = position_value * t.maintenance_margin;
        if maintenance <= 0.0 {
            return cap as u32;
        }
        let safe = (account_balance / maintenance * t.safe_leverage_factor).floor();
        safe.clamp(0.0, cap) as u32
    }

    /// Clamp a funding rate and compare it with the model rate.
    #[must_use]
    pub fn validate_funding_rate(&self, rate: f64, context: &FundingContext) -> FundingRateCheck {
        let t = &self.thresholds;
        let expected = self.expected_funding_rate(context);
        let check = FundingRateCheck {
            is_valid: (rate - expected).abs() <= t.funding_tolerance,
            adjusted_rate: rate.clamp(-t.max_funding_rate, t.max_funding_rate),
            expected_rate: expected,
        };
        debug!(
            rate,
            expected,
            adjusted = check.adjusted_rate,
            valid = check.is_valid,
            "Funding rate validated"
        );
        check
    }

    /// Funding rate predicted from premium, open interest and volatility.
    #[must_use]
    pub fn expected_funding_rate(&self, context: &FundingContext) -> f64 {
        let t = &self.thresholds;
        let crowding = (context.open_interest_ratio - 1.0) * context.volatility * 0.001;
        (context.premium_index + t.base_interest_rate + crowding)
            .clamp(-t.max_funding_rate, t.max_funding_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn baseline() -> FuturesTrade {
        FuturesTrade {
            leverage: 10.0,
            position_size: 10.0,
            account_balance: 100_000.0,
            mark_price: 100.0,
            index_price: 100.0,
            liquidity_depth: 1_000.0,
        }
    }

    fn validate(trade: &FuturesTrade) -> FuturesSecurityCheck {
        FuturesValidator::default().validate_futures_trade(trade)
    }

    #[test]
    fn baseline_is_valid() {
        let check = validate(&baseline());
        assert!(check.is_valid());
        assert!(check.result.warnings.is_empty());
        assert_eq!(check.result.risk_score, 0);
    }

    #[test]
    fn excessive_leverage_is_rejected() {
        let check = validate(&FuturesTrade {
            leverage: 150.0,
            ..baseline()
        });
        assert!(!check.is_valid());
        assert!(check
            .result
            .errors
            .contains(&"Leverage exceeds maximum: 150x > 125x".to_string()));
    }

    #[test]
    fn non_finite_inputs_are_rejected() {
        let check = validate(&FuturesTrade {
            leverage: f64::NAN,
            ..baseline()
        });
        assert!(!check.is_valid());
        assert_eq!(
            check.result.errors,
            vec!["Leverage must be a finite number: NaN".to_string()]
        );
        assert!(check.liquidation_price.is_nan());
        assert_eq!(check.max_leverage, 0);

        for field in 0..6 {
            let mut trade = baseline();
            let value = match field {
                0 => &mut trade.leverage,
                1 => &mut trade.position_size,
                2 => &mut trade.account_balance,
                3 => &mut trade.mark_price,
                4 => &mut trade.index_price,
                _ => &mut trade.liquidity_depth,
            };
            *value = f64::NEG_INFINITY;
            let check = validate(&trade);
            assert!(!check.is_valid(), "field {field} accepted -inf");
            assert!(check.result.has_error_containing("must be a finite number"));
        }
    }

    #[test]
    fn high_leverage_is_warned() {
        let check = validate(&FuturesTrade {
            leverage: 75.0,
            ..baseline()
        });
        assert!(check.is_valid());
        assert!(check.result.has_warning_containing("High leverage"));
        assert_eq!(check.result.risk_score, HIGH_LEVERAGE_WEIGHT);
    }

    #[test]
    fn sub_unit_leverage_is_rejected() {
        let check = validate(&FuturesTrade {
            leverage: 0.5,
            ..baseline()
        });
        assert!(check.result.has_error_containing("at least 1x"));
    }

    #[test]
    fn oversized_position_is_rejected() {
        let check = validate(&FuturesTrade {
            position_size: 20_000.0,
            liquidity_depth: 10_000_000.0,
            account_balance: 1_000_000.0,
            ..baseline()
        });
        assert!(check.result.has_error_containing("Position value exceeds maximum"));
    }

    #[test]
    fn insufficient_balance_is_rejected() {
        let check = validate(&FuturesTrade {
            account_balance: 50.0,
            ..baseline()
        });
        assert!(check.result.has_error_containing("Insufficient balance"));
    }

    #[test]
    fn mark_index_deviation_is_warned() {
        let check = validate(&FuturesTrade {
            mark_price: 103.0,
            ..baseline()
        });
        assert!(check.is_valid());
        assert!(check.result.has_warning_containing("deviates from index"));
    }

    #[test]
    fn price_impact_tiers() {
        // (50 / 1000)^1.5 ≈ 0.0112
        let warned = validate(&FuturesTrade {
            position_size: 50.0,
            ..baseline()
        });
        assert!(warned.is_valid());
        assert!(warned.result.has_warning_containing("price impact"));

        // (200 / 1000)^1.5 ≈ 0.089
        let rejected = validate(&FuturesTrade {
            position_size: 200.0,
            ..baseline()
        });
        assert!(rejected.result.has_error_containing("Price impact too high"));
    }

    #[test]
    fn liquidation_price_brackets_entry() {
        let validator = FuturesValidator::default();
        for leverage in [1.0, 2.0, 10.0, 50.0, 125.0] {
            let long = validator.liquidation_price(100.0, leverage, PositionSide::Long);
            let short = validator.liquidation_price(100.0, leverage, PositionSide::Short);
            assert!(long < 100.0, "long {long} at {leverage}x");
            assert!(short > 100.0, "short {short} at {leverage}x");
        }
    }

    #[test]
    fn liquidation_price_formula() {
        let validator = FuturesValidator::default();
        // 1 - (1 - 0.1 + 0.025) = 0.075
        let long = validator.liquidation_price(100.0, 10.0, PositionSide::Long);
        assert!((long - 7.5).abs() < 1e-9);
        // 1 + 0.925 = 1.925
        let short = validator.liquidation_price(100.0, 10.0, PositionSide::Short);
        assert!((short - 192.5).abs() < 1e-9);
    }

    #[test]
    fn short_position_uses_short_liquidation() {
        let check = validate(&FuturesTrade {
            position_size: -10.0,
            ..baseline()
        });
        assert!(check.liquidation_price > 100.0);
    }

    #[test]
    fn max_safe_leverage_is_capped() {
        let validator = FuturesValidator::default();
        // 100_000 / (1_000 * 0.005) * 0.8 = 16_000 -> capped
        assert_eq!(validator.max_safe_leverage(100_000.0, 1_000.0), 125);
        // 100 / (10_000 * 0.005) * 0.8 = 1.6 -> 1
        assert_eq!(validator.max_safe_leverage(100.0, 10_000.0), 1);
        assert_eq!(validator.max_safe_leverage(100.0, 0.0), 125);
    }

    #[test]
    fn margin_ratio_reported() {
        let check = validate(&baseline());
        // 1000 / 10 / 100_000
        assert!((check.margin_ratio - 0.001).abs() < 1e-12);
    }

    #[test]
    fn funding_rate_is_clamped() {
        let validator = FuturesValidator::default();
        let context = FundingContext {
            volatility: 0.5,
            open_interest_ratio: 1.0,
            premium_index: 0.0,
        };
        let check = validator.validate_funding_rate(0.05, &context);
        assert_eq!(check.adjusted_rate, 0.01);
        assert!(!check.is_valid);

        let check = validator.validate_funding_rate(-0.05, &context);
        assert_eq!(check.adjusted_rate, -0.01);
    }

    #[test]
    fn funding_rate_near_model_is_valid() {
        let validator = FuturesValidator::default();
        let context = FundingContext {
            volatility: 0.2,
            open_interest_ratio: 1.5,
            premium_index: 0.0005,
        };
        let expected = validator.expected_funding_rate(&context);
        let check = validator.validate_funding_rate(expected + 0.001, &context);
        assert!(check.is_valid);
        assert!((check.expected_rate - expected).abs() < 1e-12);
    }

    #[test]
    fn serialized_check_is_flat() {
        let json = serde_json::to_value(validate(&baseline())).unwrap();
        assert_eq!(json["isValid"], true);
        assert!(json.get("liquidationPrice").is_some());
        assert!(json.get("result").is_none());
    }
}
