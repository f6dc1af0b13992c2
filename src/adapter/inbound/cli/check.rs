//! Handlers for the `check` command group.

use std::io::Read;
use std::path::Path;

use serde_json::json;

use super::command::{CheckCommand, FlashLoanArgs, FundingArgs};
use super::{output, Verdict};
use crate::application::risk::{validate_greeks, RiskValidators};
use crate::domain::ValidationResult;
use crate::error::Result;
use crate::infrastructure::config::settings::Config;

/// Execute a `check` subcommand with validators built from `config`.
pub fn execute(command: &CheckCommand, config: &Config) -> Result<Verdict> {
    let validators = RiskValidators::from_thresholds(&config.thresholds);

    match command {
        CheckCommand::Option(args) => {
            let result = validators.options.validate_option_trade(&args.trade());
            output::result("option", &result);
            render("Option Trade", &result);
            Ok(Verdict::from_valid(result.is_valid))
        }
        CheckCommand::Futures(args) => {
            let check = validators.futures.validate_futures_trade(&args.trade());
            output::result("futures", &check);
            render("Futures Position", &check.result);
            output::field("Liquidation", format!("{:.4}", check.liquidation_price));
            output::field("Max leverage", format!("{}x", check.max_leverage));
            output::field("Margin ratio", format!("{:.2}%", check.margin_ratio * 100.0));
            Ok(Verdict::from_valid(check.is_valid()))
        }
        CheckCommand::FlashLoan(args) => execute_flash_loan(args, &validators),
        CheckCommand::Target(args) => {
            let result = validators
                .flash_loan
                .validate_flash_loan_target(&args.address, &args.selector);
            output::result("target", &result);
            render("Flash Loan Target", &result);
            Ok(Verdict::from_valid(result.is_valid))
        }
        CheckCommand::Greeks(args) => {
            let greeks = args.greeks();
            let valid = validate_greeks(&greeks);
            output::result("greeks", &json!({ "isValid": valid, "greeks": greeks }));
            output::section("Greeks");
            if valid {
                output::success("Greeks are within bounds");
            } else {
                output::error("Greeks out of bounds (|delta| <= 1, gamma >= 0, vega >= 0)");
            }
            Ok(Verdict::from_valid(valid))
        }
        CheckCommand::Funding(args) => Ok(execute_funding(args, &validators)),
    }
}

fn execute_flash_loan(args: &FlashLoanArgs, validators: &RiskValidators) -> Result<Verdict> {
    let code = read_code(&args.code)?;
    let check =
        validators
            .flash_loan
            .validate_flash_loan_code(&code, &args.strategy, args.loan, args.profit);
    output::result("flash_loan", &check);
    render("Flash Loan", &check.result);
    output::field("Complexity", check.complexity);
    output::field("Est. gas", check.estimated_gas);
    output::field("Net profit", format!("${:.2}", check.profitability));
    Ok(Verdict::from_valid(check.is_valid()))
}

fn execute_funding(args: &FundingArgs, validators: &RiskValidators) -> Verdict {
    let check = validators
        .futures
        .validate_funding_rate(args.rate, &args.context());
    output::result("funding", &check);
    output::section("Funding Rate");
    output::field("Adjusted", format!("{:.6}", check.adjusted_rate));
    output::field("Expected", format!("{:.6}", check.expected_rate));
    if check.is_valid {
        output::success("Funding rate is consistent with the model");
    } else {
        output::error("Funding rate deviates from the model rate");
    }
    Verdict::from_valid(check.is_valid)
}

/// Read contract source from `path`, or stdin when `path` is `-`.
fn read_code(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut code = String::new();
        std::io::stdin().read_to_string(&mut code)?;
        return Ok(code);
    }
    Ok(std::fs::read_to_string(path)?)
}

/// Print the human-readable form of a validation result.
fn render(title: &str, result: &ValidationResult) {
    output::section(title);
    for message in &result.errors {
        output::error(message);
    }
    for message in &result.warnings {
        output::warning(message);
    }
    if result.is_valid {
        output::success("Accepted");
    }
    output::field("Risk score", output::score(result.risk_score));
}
