//! Bounded in-memory caches.
//!
//! [`TitleCache`] holds resolved titles keyed by the URL exactly as the
//! caller passed it. Entries expire after the configured TTL and the
//! cache never grows past its capacity. Failures are never stored.

use std::hash::Hash;
use std::time::Duration;

use moka::policy::EvictionPolicy;
use moka::sync::Cache;

use crate::config::{CachePolicy, UrlTitleConfig};

/// Builds a moka cache with the given capacity, optional TTL and policy.
pub(crate) fn bounded_cache<K, V>(max_capacity: u64, ttl: Option<Duration>, policy: CachePolicy) -> Cache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    let eviction_policy = match policy {
        CachePolicy::TinyLfu => EvictionPolicy::tiny_lfu(),
        CachePolicy::Lru => EvictionPolicy::lru(),
    };

    let builder = Cache::builder().max_capacity(max_capacity).eviction_policy(eviction_policy);
    match ttl {
        Some(ttl) => builder.time_to_live(ttl).build(),
        None => builder.build(),
    }
}

/// Thread-safe TTL cache of resolved titles.
#[derive(Clone)]
pub struct TitleCache {
    entries: Cache<String, String>,
}

impl TitleCache {
    /// Creates a cache sized and timed by `config`.
    pub fn new(config: &UrlTitleConfig) -> Self {
        Self {
            entries: bounded_cache(config.title_cache_max_size, Some(config.title_cache_ttl), config.cache_policy),
        }
    }

    /// Looks up a cached title. Returns `None` on miss or expiry.
    pub fn get(&self, url: &str) -> Option<String> {
        self.entries.get(url)
    }

    pub fn insert(&self, url: &str, title: &str) {
        self.entries.insert(url.to_string(), title.to_string());
    }

    /// Number of entries currently in the cache.
    ///
    /// moka applies pending writes lazily, so this may lag behind inserts.
    pub fn len(&self) -> u64 {
        self.entries.run_pending_tasks();
        self.entries.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Evict all entries.
    pub fn clear(&self) {
        self.entries.invalidate_all();
    }
}

impl std::fmt::Debug for TitleCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TitleCache").field("entries", &self.entries.entry_count()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_cache_roundtrip() {
        let cache = TitleCache::new(&UrlTitleConfig::default());
        assert!(cache.get("https://example.com").is_none());

        cache.insert("https://example.com", "Example Domain");
        assert_eq!(cache.get("https://example.com").as_deref(), Some("Example Domain"));
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.get("https://example.com").is_none());
    }

    #[test]
    fn test_title_cache_expires() {
        let config = UrlTitleConfig::builder().title_cache_ttl(Duration::from_millis(50)).build();
        let cache = TitleCache::new(&config);

        cache.insert("https://example.com", "Example Domain");
        std::thread::sleep(Duration::from_millis(120));
        assert!(cache.get("https://example.com").is_none());
    }

    #[test]
    fn test_title_cache_bounded() {
        let config = UrlTitleConfig::builder()
            .title_cache_max_size(2)
            .cache_policy(CachePolicy::Lru)
            .build();
        let cache = TitleCache::new(&config);

        for i in 0..10 {
            cache.insert(&format!("https://example.com/{}", i), "t");
        }
        assert!(cache.len() <= 2);
    }
}
