//! Pre-trade risk validators.
//!
//! Every validator is a pure function of its inputs and the thresholds it was
//! built with. Rejections are reported inside the returned result, never as
//! `Err`, so callers branch on `is_valid`.

pub mod flash_loan;
pub mod futures;
pub mod manipulation;
pub mod option;

pub use flash_loan::{CodeMetrics, FlashLoanSecurityCheck, FlashLoanValidator};
pub use futures::{FundingRateCheck, FuturesSecurityCheck, FuturesValidator};
pub use manipulation::{ManipulationDetector, ManipulationKind, ManipulationSignal};
pub use option::{validate_greeks, OptionValidator};

use crate::infrastructure::config::thresholds::ThresholdsConfig;

/// The three validators built from one set of thresholds.
#[derive(Debug, Clone, Default)]
pub struct RiskValidators {
    pub options: OptionValidator,
    pub futures: FuturesValidator,
    pub flash_loan: FlashLoanValidator,
}

impl RiskValidators {
    #[must_use]
    pub fn from_thresholds(thresholds: &ThresholdsConfig) -> Self {
        Self {
            options: OptionValidator::new(thresholds.options.clone()),
            futures: FuturesValidator::new(thresholds.futures.clone()),
            flash_loan: FlashLoanValidator::new(thresholds.flash_loan.clone()),
        }
    }
}
