//! Builders for trade requests used across tests.
//!
//! Each builder returns a request that passes its validator cleanly, so a
//! test only spells out the field it is exercising.

use crate::domain::{FuturesTrade, OptionTrade, TradeTick};

/// An at-the-money option on a deep pool: no errors, no warnings.
pub fn option_trade() -> OptionTrade {
    OptionTrade {
        strike_price: 100.0,
        spot_price: 100.0,
        implied_volatility: 0.3,
        time_to_expiry: 86_400.0,
        quantity: 1.0,
        total_liquidity: 1_000_000.0,
    }
}

/// A small 10x long with mark equal to index on a deep book.
pub fn futures_trade() -> FuturesTrade {
    FuturesTrade {
        leverage: 10.0,
        position_size: 10.0,
        account_balance: 100_000.0,
        mark_price: 100.0,
        index_price: 100.0,
        liquidity_depth: 100_000.0,
    }
}

/// `n` ticks at a constant price and volume, one time unit apart.
pub fn flat_window(n: usize, price: f64, volume: f64) -> Vec<TradeTick> {
    (0..n)
        .map(|i| TradeTick::new(price, volume, i as u64))
        .collect()
}

/// Ticks alternating between `low` and `high` every `interval` time units.
pub fn zigzag_window(n: usize, low: f64, high: f64, interval: u64) -> Vec<TradeTick> {
    (0..n)
        .map(|i| {
            let price = if i % 2 == 0 { low } else { high };
            TradeTick::new(price, 1.0, i as u64 * interval)
        })
        .collect()
}

/// A minimal contract body with no external calls or dangerous patterns.
pub const CLEAN_CONTRACT: &str = r#"
function executeOperation(uint256 amount) external returns (bool) {
    uint256 fee = amount / 1000;
    return true;
}
"#;
