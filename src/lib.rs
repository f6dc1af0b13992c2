//! xpguard - Pre-trade risk validation and tiered caching for XPSwap.
//!
//! This crate provides the security checks that run before an options,
//! futures or flash-loan action is accepted by the XPSwap backend, and the
//! cache layer that backs the backend's read paths.
//!
//! # Architecture
//!
//! The crate follows a ports-and-adapters layout:
//!
//! - **`application::risk`** - Pre-trade validators
//!   - `OptionValidator` - Strike, volatility, expiry and liquidity checks
//!   - `FuturesValidator` - Leverage, margin, liquidation and funding checks
//!   - `FlashLoanValidator` - Code scanning, gas and profitability checks
//!   - `ManipulationDetector` - Oracle deviation, wash trading, spoofing
//!
//! - **`application::cache`** - Cache implementations and combinators
//!   - `MemoryCache` - Bounded in-process cache with LRU/LFU/FIFO eviction
//!   - `HybridCache` - Memory in front of an optional remote tier
//!   - `SyncManager` / `SyncedCache` - Cross-node invalidation
//!   - `ResponseCache` / `Cacheable` - Request and function memoization
//!
//! - **`adapter`** - Redis cache and bus, in-process bus, and the CLI
//!
//! # Modules
//!
//! - [`domain`] - Trade requests, validation results, sync events
//! - [`port`] - `CacheService` and `MessageBus` traits
//! - [`application`] - Validators and cache implementations
//! - [`adapter`] - Implementations of ports and the CLI
//! - [`infrastructure`] - Configuration loading and component factories
//! - [`error`] - Error types for the crate
//!
//! # Example
//!
//! ```
//! use xpguard::application::risk::OptionValidator;
//! use xpguard::domain::OptionTrade;
//!
//! let validator = OptionValidator::default();
//! let result = validator.validate_option_trade(&OptionTrade {
//!     strike_price: 100.0,
//!     spot_price: 100.0,
//!     implied_volatility: 0.3,
//!     time_to_expiry: 86_400.0,
//!     quantity: 1.0,
//!     total_liquidity: 1_000_000.0,
//! });
//! assert!(result.is_valid);
//! assert_eq!(result.risk_score, 0);
//! ```

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
