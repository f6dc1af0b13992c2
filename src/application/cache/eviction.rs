//! Eviction policies for the bounded memory cache.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use super::memory::CacheEntry;

/// Rule for choosing which entry to drop when the cache is full.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvictionPolicy {
    /// Least recently used: oldest `get` or `set`.
    #[default]
    #[serde(alias = "LRU")]
    Lru,
    /// Least frequently used: fewest hits, oldest insertion on ties.
    #[serde(alias = "LFU")]
    Lfu,
    /// First in, first out: oldest insertion.
    #[serde(alias = "FIFO")]
    Fifo,
}

impl EvictionPolicy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lru => "lru",
            Self::Lfu => "lfu",
            Self::Fifo => "fifo",
        }
    }

    /// Pick the key to evict. An expired entry is always preferred.
    ///
    /// One pass over `entries`, stopping at the first expired entry. The
    /// caller holds the cache write lock, so every insert into a full cache
    /// costs `O(max_size)`.
    pub(crate) fn select_victim(
        self,
        entries: &HashMap<String, CacheEntry>,
        now: Instant,
    ) -> Option<String> {
        let mut victim: Option<(&String, (u64, u64))> = None;
        for (key, entry) in entries {
            if entry.is_expired(now) {
                return Some(key.clone());
            }
            let rank = self.rank(entry);
            match victim {
                Some((_, best)) if best <= rank => {}
                _ => victim = Some((key, rank)),
            }
        }
        victim.map(|(key, _)| key.clone())
    }

    /// Lower ranks are evicted first.
    fn rank(self, entry: &CacheEntry) -> (u64, u64) {
        match self {
            Self::Lru => (entry.last_access(), entry.sequence()),
            Self::Lfu => (entry.hits(), entry.sequence()),
            Self::Fifo => (entry.sequence(), 0),
        }
    }
}

impl fmt::Display for EvictionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EvictionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lru" => Ok(Self::Lru),
            "lfu" => Ok(Self::Lfu),
            "fifo" => Ok(Self::Fifo),
            other => Err(format!("unknown eviction policy '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    fn entries() -> HashMap<String, CacheEntry> {
        let now = Instant::now();
        let ttl = Duration::from_secs(60);
        let mut map = HashMap::new();
        // (key, sequence, last access, hits)
        for (key, seq, access, hits) in [("a", 1, 5, 3), ("b", 2, 2, 1), ("c", 3, 9, 1)] {
            let entry = CacheEntry::new(json!(key), now, ttl, seq, access);
            for _ in 0..hits {
                entry.touch(access);
            }
            map.insert(key.to_string(), entry);
        }
        map
    }

    #[test]
    fn lru_picks_oldest_access() {
        let victim = EvictionPolicy::Lru.select_victim(&entries(), Instant::now());
        assert_eq!(victim.as_deref(), Some("b"));
    }

    #[test]
    fn lfu_breaks_ties_by_age() {
        let victim = EvictionPolicy::Lfu.select_victim(&entries(), Instant::now());
        assert_eq!(victim.as_deref(), Some("b"));
    }

    #[test]
    fn fifo_picks_first_inserted() {
        let victim = EvictionPolicy::Fifo.select_victim(&entries(), Instant::now());
        assert_eq!(victim.as_deref(), Some("a"));
    }

    #[test]
    fn expired_entry_is_preferred() {
        let mut map = entries();
        let stale = Instant::now() - Duration::from_secs(10);
        map.insert(
            "z".to_string(),
            CacheEntry::new(json!(0), stale, Duration::from_secs(1), 99, 99),
        );
        let victim = EvictionPolicy::Fifo.select_victim(&map, Instant::now());
        assert_eq!(victim.as_deref(), Some("z"));
    }

    #[test]
    fn expired_entry_wins_under_every_policy() {
        let stale = Instant::now() - Duration::from_secs(10);
        for policy in [EvictionPolicy::Lru, EvictionPolicy::Lfu, EvictionPolicy::Fifo] {
            let mut map = entries();
            // Lowest rank under every policy, but still live.
            map.insert(
                "fresh".to_string(),
                CacheEntry::new(json!(0), Instant::now(), Duration::from_secs(60), 0, 0),
            );
            map.insert(
                "z".to_string(),
                CacheEntry::new(json!(0), stale, Duration::from_secs(1), 99, 99),
            );
            let victim = policy.select_victim(&map, Instant::now());
            assert_eq!(victim.as_deref(), Some("z"), "{policy}");
        }
    }

    #[test]
    fn empty_cache_has_no_victim() {
        let victim = EvictionPolicy::Lru.select_victim(&HashMap::new(), Instant::now());
        assert_eq!(victim, None);
    }

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("LRU".parse::<EvictionPolicy>(), Ok(EvictionPolicy::Lru));
        assert_eq!("Fifo".parse::<EvictionPolicy>(), Ok(EvictionPolicy::Fifo));
        assert!("random".parse::<EvictionPolicy>().is_err());
    }
}
