//! Validation outcome types shared by every pre-trade validator.
//!
//! Validators never fail with `Err`: hard rule violations are collected as
//! `errors`, advisory findings as `warnings`, and every warning contributes a
//! weight to a risk score that is clamped to [`MAX_RISK_SCORE`].

use serde::Serialize;

/// Upper bound of [`ValidationResult::risk_score`].
pub const MAX_RISK_SCORE: u32 = 100;

/// Outcome of a single validation call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// True iff `errors` is empty.
    pub is_valid: bool,
    /// Hard failures. Any entry means the action must be rejected.
    pub errors: Vec<String>,
    /// Soft issues. The action may proceed.
    pub warnings: Vec<String>,
    /// Weighted sum of warning contributions, clamped to `0..=100`.
    pub risk_score: u32,
}

impl ValidationResult {
    /// Return `true` if the action may proceed.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.is_valid
    }

    /// Return `true` if any error message contains `needle`.
    #[must_use]
    pub fn has_error_containing(&self, needle: &str) -> bool {
        self.errors.iter().any(|e| e.contains(needle))
    }

    /// Return `true` if any warning message contains `needle`.
    #[must_use]
    pub fn has_warning_containing(&self, needle: &str) -> bool {
        self.warnings.iter().any(|w| w.contains(needle))
    }
}

/// Accumulates findings while a validator runs its rules.
///
/// Rules are evaluated in order and never short-circuit; [`RiskReport::finish`]
/// derives `is_valid` and clamps the score.
#[derive(Debug, Default)]
pub struct RiskReport {
    errors: Vec<String>,
    warnings: Vec<String>,
    score: u32,
}

impl RiskReport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a hard failure.
    pub fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    /// Record an advisory finding and add `weight` to the risk score.
    pub fn warn(&mut self, message: impl Into<String>, weight: u32) {
        self.warnings.push(message.into());
        self.score = self.score.saturating_add(weight);
    }

    /// Record an error for every input that is NaN or infinite.
    ///
    /// Returns `true` when all inputs are finite. Range rules compare with
    /// `<` and `>`, which NaN never satisfies, so callers stop on `false`.
    pub fn require_finite(&mut self, inputs: &[(&str, f64)]) -> bool {
        let mut finite = true;
        for (name, value) in inputs {
            if !value.is_finite() {
                self.error(format!("{name} must be a finite number: {value}"));
                finite = false;
            }
        }
        finite
    }

    #[must_use]
    pub fn finish(self) -> ValidationResult {
        ValidationResult {
            is_valid: self.errors.is_empty(),
            errors: self.errors,
            warnings: self.warnings,
            risk_score: self.score.min(MAX_RISK_SCORE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_report_is_valid() {
        let result = RiskReport::new().finish();
        assert!(result.is_valid());
        assert!(result.errors.is_empty());
        assert!(result.warnings.is_empty());
        assert_eq!(result.risk_score, 0);
    }

    #[test]
    fn error_makes_result_invalid() {
        let mut report = RiskReport::new();
        report.error("boom");
        let result = report.finish();
        assert!(!result.is_valid());
        assert!(result.has_error_containing("boom"));
    }

    #[test]
    fn warnings_do_not_invalidate() {
        let mut report = RiskReport::new();
        report.warn("careful", 30);
        let result = report.finish();
        assert!(result.is_valid());
        assert_eq!(result.risk_score, 30);
    }

    #[test]
    fn non_finite_inputs_are_errors() {
        let mut report = RiskReport::new();
        assert!(report.require_finite(&[("Price", 1.0), ("Size", -2.5)]));
        assert!(!report.require_finite(&[
            ("Leverage", f64::NAN),
            ("Price", 1.0),
            ("Balance", f64::INFINITY),
        ]));
        let result = report.finish();
        assert_eq!(
            result.errors,
            vec![
                "Leverage must be a finite number: NaN".to_string(),
                "Balance must be a finite number: inf".to_string(),
            ]
        );
    }

    #[test]
    fn score_is_clamped() {
        let mut report = RiskReport::new();
        for _ in 0..10 {
            report.warn("again", 20);
        }
        assert_eq!(report.finish().risk_score, MAX_RISK_SCORE);
    }

    #[test]
    fn serializes_camel_case() {
        let mut report = RiskReport::new();
        report.warn("w", 5);
        let json = serde_json::to_value(report.finish()).unwrap();
        assert_eq!(json["isValid"], true);
        assert_eq!(json["riskScore"], 5);
        assert_eq!(json["warnings"][0], "w");
    }
}
