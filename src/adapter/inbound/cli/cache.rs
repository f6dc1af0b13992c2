//! Handlers for the `cache` command group.

use super::output;
use crate::error::Result;
use crate::infrastructure::config::settings::Config;
use crate::infrastructure::factory::build_cache;

/// Execute `cache stats`.
pub async fn execute_stats(config: &Config) -> Result<()> {
    let runtime = build_cache(config).await;
    let stats = runtime.cache().stats().await?;

    output::result("cache_stats", &stats);
    output::section("Cache");
    output::field("Backend", output::highlight(runtime.backend()));
    output::field("Entries", stats.size);
    output::field("Hits", stats.hits);
    output::field("Misses", stats.misses);
    output::field("Hit rate", format!("{:.1}%", stats.hit_rate * 100.0));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::config::memory_config;

    #[test]
    fn stats_for_memory_backend() {
        assert!(tokio_test::block_on(execute_stats(&memory_config())).is_ok());
    }
}
