//! Handlers for the `config` command group.

use std::path::Path;

use super::output;
use crate::error::Result;
use crate::infrastructure::config::settings::Config;

/// Execute `config validate`.
///
/// A missing file is not an error: defaults are validated instead.
pub fn execute_validate(path: &Path) -> Result<Config> {
    let config = Config::load_or_default(path)?;

    output::section("Configuration Check");
    output::field("Config", path.display());
    if path.exists() {
        output::success("Configuration file is valid");
    } else {
        output::warning("Configuration file not found, defaults are valid");
    }
    Ok(config)
}

/// Execute `config show`.
pub fn execute_show(path: &Path) -> Result<()> {
    let config = Config::load_or_default(path)?;

    output::section("Cache");
    output::field("Kind", config.cache.kind.as_str());
    output::field("Default TTL", format!("{}ms", config.cache.default_ttl_ms));
    output::field("Max size", config.cache.max_size);
    output::field("Eviction", config.cache.eviction);
    output::field(
        "Redis",
        config.cache.redis_url.as_deref().unwrap_or("(not set)"),
    );
    output::field("Key prefix", &config.cache.key_prefix);

    output::section("Cluster");
    output::field("Enabled", config.cluster.enabled);
    output::field("Node ID", &config.cluster.node_id);
    output::field("Channel", &config.cluster.channel);

    let thresholds = &config.thresholds;
    output::section("Thresholds");
    output::field(
        "Leverage",
        format!(
            "warn > {}x, max {}x",
            thresholds.futures.high_leverage, thresholds.futures.max_leverage
        ),
    );
    output::field(
        "Position",
        format!("max ${}", thresholds.futures.max_position_value_usd),
    );
    output::field(
        "IV range",
        format!(
            "{} - {}",
            thresholds.options.min_implied_volatility, thresholds.options.max_implied_volatility
        ),
    );
    output::field("Max gas", thresholds.flash_loan.max_gas);
    output::field("Max complex.", thresholds.flash_loan.max_complexity);
    output::field(
        "Blacklist",
        format!("{} targets", thresholds.flash_loan.blacklisted_targets.len()),
    );
    Ok(())
}
