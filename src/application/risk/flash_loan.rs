//! Flash-loan contract code and target validation.
//!
//! The code checks are a static text scan over Solidity source. They do not
//! parse the language: patterns are matched per line, and the reentrancy check
//! only compares line order, so both false positives and false negatives are
//! expected.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::domain::{FlashLoanStrategy, RiskReport, ValidationResult};
use crate::infrastructure::config::thresholds::FlashLoanThresholds;

const DANGEROUS_PATTERN_WEIGHT: u32 = 20;
const LOW_PROFIT_WEIGHT: u32 = 15;

/// Substrings that make a contract unsafe to execute, with a short label.
const DANGEROUS_PATTERNS: &[(&[&str], &str)] = &[
    (&["selfdestruct"], "selfdestruct"),
    (&["suicide("], "suicide()"),
    (&["delegatecall"], "delegatecall"),
    (&[".call.value(", ".call{value"], "low-level call with value"),
    (&["tx.origin"], "tx.origin"),
    (&["assembly"], "inline assembly"),
    (&["blockhash"], "blockhash"),
];

fn external_call_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\.(?:call|send|transfer)(?:\.value)?\s*[({]")
            .expect("external call pattern is valid")
    })
}

fn loop_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\b(?:for|while)\s*\(").expect("loop pattern is valid"))
}

fn local_declaration_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"^\(?\s*(?:u?int\d*|bool|address(?:\s+payable)?|bytes\d*|string|var)\b|\b(?:memory|calldata)\b",
        )
        .expect("declaration pattern is valid")
    })
}

fn collection_mutation_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\+\+|--|[+\-*/]=|\.push\s*\(|\.pop\s*\(|\bdelete\s")
            .expect("mutation pattern is valid")
    })
}

/// Result of [`FlashLoanValidator::validate_flash_loan_code`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlashLoanSecurityCheck {
    #[serde(flatten)]
    pub result: ValidationResult,
    pub estimated_gas: u64,
    /// Expected net profit in USD after fees and gas.
    pub profitability: f64,
    pub complexity: u32,
}

impl FlashLoanSecurityCheck {
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.result.is_valid
    }
}

/// Structural counts extracted from contract source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CodeMetrics {
    pub external_calls: u32,
    pub loops: u32,
    pub storage_mutations: u32,
    pub max_nesting: u32,
    /// Zero-based line of the first storage mutation after an external call.
    pub mutation_after_call: Option<usize>,
}

impl CodeMetrics {
    /// Scan `code` line by line.
    #[must_use]
    pub fn scan(code: &str) -> Self {
        let mut metrics = Self::default();
        let mut first_call_line = None;

        for (index, line) in code.lines().enumerate() {
            let line = line.trim();
            if is_comment(line) {
                continue;
            }

            let calls = count(external_call_pattern().find_iter(line).count());
            metrics.external_calls += calls;
            metrics.loops += count(loop_pattern().find_iter(line).count());

            if is_storage_mutation(line) {
                metrics.storage_mutations += 1;
                if first_call_line.is_some_and(|first| index > first)
                    && metrics.mutation_after_call.is_none()
                {
                    metrics.mutation_after_call = Some(index);
                }
            }

            if calls > 0 && first_call_line.is_none() {
                first_call_line = Some(index);
            }
        }

        metrics.max_nesting = max_brace_depth(code);
        metrics
    }

    /// Calls plus twice the loops plus the deepest `{}` nesting.
    #[must_use]
    pub const fn complexity(&self) -> u32 {
        self.external_calls + 2 * self.loops + self.max_nesting
    }
}

fn count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

fn is_comment(line: &str) -> bool {
    line.starts_with("//") || line.starts_with("/*") || line.starts_with('*')
}

fn max_brace_depth(code: &str) -> u32 {
    let mut depth: u32 = 0;
    let mut max = 0;
    for c in code.chars() {
        match c {
            '{' => {
                depth += 1;
                max = max.max(depth);
            }
            '}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    max
}

/// Heuristic for a statement that writes contract state.
///
/// A line counts when it assigns (a lone `=` or a compound assignment),
/// increments, decrements, or pushes, pops or deletes. Loop headers and
/// lines declaring a local are not counted.
#[must_use]
pub fn is_storage_mutation(line: &str) -> bool {
    let line = line.trim();
    if line.is_empty() || is_comment(line) {
        return false;
    }
    if line.starts_with("for ") || line.starts_with("for(") {
        return false;
    }
    if local_declaration_pattern().is_match(line) {
        return false;
    }
    collection_mutation_pattern().is_match(line) || has_bare_assignment(line)
}

fn has_bare_assignment(line: &str) -> bool {
    let bytes = line.as_bytes();
    bytes.iter().enumerate().any(|(i, &b)| {
        if b != b'=' {
            return false;
        }
        let prev = i.checked_sub(1).map(|p| bytes[p]);
        let next = bytes.get(i + 1).copied();
        !matches!(prev, Some(b'=' | b'!' | b'<' | b'>' | b'+' | b'-' | b'*' | b'/'))
            && !matches!(next, Some(b'=' | b'>'))
    })
}

fn is_hex_with_prefix(value: &str, digits: usize) -> bool {
    value
        .strip_prefix("0x")
        .is_some_and(|hex| hex.len() == digits && hex.bytes().all(|b| b.is_ascii_hexdigit()))
}

/// Validates flash-loan contract code and call targets.
#[derive(Debug, Clone, Default)]
pub struct FlashLoanValidator {
    thresholds: FlashLoanThresholds,
}

impl FlashLoanValidator {
    #[must_use]
    pub const fn new(thresholds: FlashLoanThresholds) -> Self {
        Self { thresholds }
    }

    #[must_use]
    pub const fn thresholds(&self) -> &FlashLoanThresholds {
        &self.thresholds
    }

    /// Validate contract source for a flash-loan strategy.
    #[must_use]
    pub fn validate_flash_loan_code(
        &self,
        code: &str,
        strategy: &str,
        loan_amount: f64,
        expected_profit: f64,
    ) -> FlashLoanSecurityCheck {
        let t = &self.thresholds;
        let mut report = RiskReport::new();

        if strategy.parse::<FlashLoanStrategy>().is_err() {
            report.error(format!("Unsupported flash loan strategy: {strategy}"));
        }

        if !report.require_finite(&[
            ("Loan amount", loan_amount),
            ("Expected profit", expected_profit),
        ]) {
            return FlashLoanSecurityCheck {
                result: report.finish(),
                estimated_gas: 0,
                profitability: f64::NAN,
                complexity: CodeMetrics::scan(code).complexity(),
            };
        }

        for (needles, label) in DANGEROUS_PATTERNS {
            if needles.iter().any(|n| code.contains(n)) {
                report.warn(
                    format!("Dangerous pattern detected: {label}"),
                    DANGEROUS_PATTERN_WEIGHT,
                );
            }
        }

        let metrics = CodeMetrics::scan(code);
        let complexity = metrics.complexity();
        if complexity > t.max_complexity {
            report.error(format!(
                "Code complexity too high: {complexity} (maximum {})",
                t.max_complexity
            ));
        }

        if loan_amount <= 0.0 {
            report.error(format!("Loan amount must be positive: {loan_amount}"));
        }
        let estimated_gas = self.estimate_gas(&metrics, loan_amount);
        if estimated_gas > t.max_gas {
            report.error(format!(
                "Estimated gas exceeds limit: {estimated_gas} > {}",
                t.max_gas
            ));
        }

        let profitability = self.net_profit(loan_amount, expected_profit, estimated_gas);
        if profitability < t.min_net_profit_usd {
            report.warn(
                format!(
                    "Low net profit: ${profitability:.2} (minimum ${:.2})",
                    t.min_net_profit_usd
                ),
                LOW_PROFIT_WEIGHT,
            );
        }

        if let Some(line) = metrics.mutation_after_call {
            report.error(format!(
                "Potential reentrancy: state modified after external call (line {})",
                line + 1
            ));
        }

        let check = FlashLoanSecurityCheck {
            result: report.finish(),
            estimated_gas,
            profitability,
            complexity,
        };
        debug!(
            strategy,
            valid = check.result.is_valid,
            risk_score = check.result.risk_score,
            estimated_gas,
            complexity,
            "Flash loan code validated"
        );
        check
    }

    /// Gas estimate scaled by loan size. The scale factor never drops below 1.
    #[must_use]
    pub fn estimate_gas(&self, metrics: &CodeMetrics, loan_amount: f64) -> u64 {
        let t = &self.thresholds;
        let base = t.base_gas
            + t.gas_per_external_call * u64::from(metrics.external_calls)
            + t.gas_per_storage_write * u64::from(metrics.storage_mutations)
            + t.gas_per_loop * u64::from(metrics.loops);
        let factor = if loan_amount > 0.0 {
            (1.0 + (loan_amount / 1_000.0).log10() / 2.0).max(1.0)
        } else {
            1.0
        };
        (base as f64 * factor).round() as u64
    }

    /// Expected profit minus protocol fee and gas cost, in USD.
    #[must_use]
    pub fn net_profit(&self, loan_amount: f64, expected_profit: f64, gas: u64) -> f64 {
        let t = &self.thresholds;
        let fee = loan_amount * t.fee_rate;
        let gas_cost = gas as f64 * t.gas_price_gwei * 1e-9 * t.eth_price_usd;
        expected_profit - fee - gas_cost
    }

    /// Validate a contract address and function selector.
    #[must_use]
    pub fn validate_flash_loan_target(&self, address: &str, selector: &str) -> ValidationResult {
        let mut report = RiskReport::new();

        if !is_hex_with_prefix(address, 40) {
            report.error(format!("Invalid contract address: {address}"));
        } else if self.thresholds.is_blacklisted(address) {
            report.error(format!("Contract address is blacklisted: {address}"));
        }

        if !is_hex_with_prefix(selector, 8) {
            report.error(format!("Invalid function selector: {selector}"));
        }

        let result = report.finish();
        debug!(address, selector, valid = result.is_valid, "Flash loan target validated");
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAFE_CODE: &str = r#"
contract Arb {
    function execute(uint256 amount) external {
        uint256 before = token.balanceOf(address(this));
        router.swap(amount);
        require(token.balanceOf(address(this)) > before);
    }
}
"#;

    const REENTRANT_CODE: &str = r#"
function withdraw(uint256 amount) external {
    require(balances[msg.sender] >= amount);
    (bool ok, ) = msg.sender.call{value: amount}("");
    require(ok);
    balances[msg.sender] -= amount;
}
"#;

    fn validator() -> FlashLoanValidator {
        FlashLoanValidator::default()
    }

    #[test]
    fn safe_code_passes() {
        let check = validator().validate_flash_loan_code(SAFE_CODE, "arbitrage", 10_000.0, 500.0);
        assert!(check.is_valid(), "{:?}", check.result.errors);
        assert!(check.result.warnings.is_empty());
        assert_eq!(check.result.risk_score, 0);
    }

    #[test]
    fn unknown_strategy_is_rejected() {
        let check = validator().validate_flash_loan_code(SAFE_CODE, "sandwich", 10_000.0, 500.0);
        assert!(check.result.has_error_containing("Unsupported flash loan strategy"));
    }

    #[test]
    fn every_strategy_is_accepted() {
        for strategy in FlashLoanStrategy::ALL {
            let check =
                validator().validate_flash_loan_code(SAFE_CODE, strategy.as_str(), 10_000.0, 500.0);
            assert!(check.is_valid(), "{strategy}");
        }
    }

    #[test]
    fn dangerous_patterns_add_weight() {
        let code = "function f() { assembly { } selfdestruct(owner); require(tx.origin == owner); }";
        let check = validator().validate_flash_loan_code(code, "arbitrage", 10_000.0, 500.0);
        assert_eq!(check.result.warnings.len(), 3);
        assert_eq!(check.result.risk_score, 60);
    }

    #[test]
    fn call_value_forms_count_once() {
        let code = "a.call.value(1)(); b.call{value: 1}(\"\");";
        let check = validator().validate_flash_loan_code(code, "arbitrage", 10_000.0, 500.0);
        assert_eq!(
            check
                .result
                .warnings
                .iter()
                .filter(|w| w.contains("low-level call"))
                .count(),
            1
        );
    }

    #[test]
    fn reentrancy_is_detected() {
        let check = validator().validate_flash_loan_code(REENTRANT_CODE, "arbitrage", 10_000.0, 500.0);
        assert!(check.result.has_error_containing("Potential reentrancy"));
    }

    #[test]
    fn mutation_before_call_is_not_reentrancy() {
        let code = r#"
function withdraw(uint256 amount) external {
    balances[msg.sender] -= amount;
    payable(msg.sender).transfer(amount);
}
"#;
        let check = validator().validate_flash_loan_code(code, "arbitrage", 10_000.0, 500.0);
        assert!(!check.result.has_error_containing("reentrancy"));
    }

    #[test]
    fn complexity_counts_calls_loops_and_nesting() {
        let code = r#"
function f() {
    for (uint i = 0; i < n; i++) {
        while (x < 10) {
            a.call("");
            b.send(1);
        }
    }
}
"#;
        let metrics = CodeMetrics::scan(code);
        assert_eq!(metrics.external_calls, 2);
        assert_eq!(metrics.loops, 2);
        assert_eq!(metrics.max_nesting, 3);
        assert_eq!(metrics.complexity(), 9);
    }

    #[test]
    fn excessive_complexity_is_rejected() {
        let code = "for (;;) { for (;;) { for (;;) { for (;;) { a.call(\"\"); } } } }";
        let check = validator().validate_flash_loan_code(code, "arbitrage", 10_000.0, 500.0);
        assert!(check.result.has_error_containing("complexity too high"));
    }

    #[test]
    fn storage_mutation_heuristic() {
        assert!(is_storage_mutation("balances[user] = 0;"));
        assert!(is_storage_mutation("total += amount;"));
        assert!(is_storage_mutation("counter++;"));
        assert!(is_storage_mutation("holders.push(user);"));
        assert!(is_storage_mutation("delete balances[user];"));

        assert!(!is_storage_mutation("require(a == b);"));
        assert!(!is_storage_mutation("if (a >= b) {"));
        assert!(!is_storage_mutation("uint256 x = 1;"));
        assert!(!is_storage_mutation("(bool ok, ) = to.call{value: v}(\"\");"));
        assert!(!is_storage_mutation("Order memory o = orders[id];"));
        assert!(!is_storage_mutation("// owner = msg.sender;"));
        assert!(!is_storage_mutation("for (uint i = 0; i < n; i++) {"));
    }

    #[test]
    fn gas_scale_factor_is_floored() {
        let metrics = CodeMetrics::default();
        let v = validator();
        assert_eq!(v.estimate_gas(&metrics, 1.0), 100_000);
        assert_eq!(v.estimate_gas(&metrics, 1_000.0), 100_000);
        // 1 + log10(100) / 2 = 2
        assert_eq!(v.estimate_gas(&metrics, 100_000.0), 200_000);
    }

    #[test]
    fn gas_limit_is_enforced() {
        let calls = "a.call(\"\");\n".repeat(200);
        let check = validator().validate_flash_loan_code(&calls, "arbitrage", 10_000.0, 1e9);
        assert!(check.result.has_error_containing("Estimated gas exceeds limit"));
    }

    #[test]
    fn non_positive_loan_is_rejected() {
        let check = validator().validate_flash_loan_code(SAFE_CODE, "arbitrage", 0.0, 500.0);
        assert!(check.result.has_error_containing("Loan amount must be positive"));
    }

    #[test]
    fn non_finite_amounts_are_rejected() {
        let check = validator().validate_flash_loan_code(SAFE_CODE, "arbitrage", 1_000.0, f64::NAN);
        assert!(!check.is_valid());
        assert!(check.result.has_error_containing("Expected profit must be a finite number"));
        assert!(check.profitability.is_nan());

        let check =
            validator().validate_flash_loan_code(SAFE_CODE, "arbitrage", f64::INFINITY, 100.0);
        assert!(!check.is_valid());
        assert!(check.result.has_error_containing("Loan amount must be a finite number"));
        assert_eq!(check.estimated_gas, 0);
    }

    #[test]
    fn low_profit_is_warned() {
        let check = validator().validate_flash_loan_code(SAFE_CODE, "arbitrage", 10_000.0, 5.0);
        assert!(check.is_valid());
        assert!(check.result.has_warning_containing("Low net profit"));
        assert_eq!(check.result.risk_score, 15);
        assert!(check.profitability < 10.0);
    }

    #[test]
    fn net_profit_formula() {
        // 1000 - 100_000 * 0.0009 - 100_000 * 30e-9 * 2000 = 1000 - 90 - 6
        let profit = validator().net_profit(100_000.0, 1_000.0, 100_000);
        assert!((profit - 904.0).abs() < 1e-6);
    }

    #[test]
    fn target_validation() {
        let v = validator();
        let ok = v.validate_flash_loan_target("0x1111111111111111111111111111111111111111", "0xa9059cbb");
        assert!(ok.is_valid);

        let bad = v.validate_flash_loan_target("0x1234", "a9059cbb");
        assert!(bad.has_error_containing("Invalid contract address"));
        assert!(bad.has_error_containing("Invalid function selector"));

        let dead = v.validate_flash_loan_target("0x000000000000000000000000000000000000dEaD", "0xa9059cbb");
        assert!(dead.has_error_containing("blacklisted"));

        let zero = v.validate_flash_loan_target("0x0000000000000000000000000000000000000000", "0xa9059cbb");
        assert!(!zero.is_valid);
    }

    #[test]
    fn configured_blacklist_is_applied() {
        let target = "0xABCDEFabcdefABCDEFabcdefABCDEFabcdefABCD";
        let v = FlashLoanValidator::new(FlashLoanThresholds {
            blacklisted_targets: vec![target.to_lowercase()],
            ..FlashLoanThresholds::default()
        });
        assert!(!v.validate_flash_loan_target(target, "0x12345678").is_valid);
    }
}
