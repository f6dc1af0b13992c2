//! Infrastructure-free domain types.

mod sync;
mod trade;
mod validation;

pub use sync::{CacheSyncEvent, SyncKind};
pub use trade::{
    FlashLoanStrategy, FundingContext, FuturesTrade, Greeks, OptionTrade, PositionSide, TradeTick,
};
pub use validation::{RiskReport, ValidationResult, MAX_RISK_SCORE};
