use std::collections::HashSet;
use std::sync::RwLock;

use tracing::warn;

/// Answers whether a remote resource is already available locally.
pub trait LocalityCache: Send + Sync {
    fn is_cached(&self, key: &str) -> bool;
}

/// Cache that never has anything.
pub struct NoCache;

impl LocalityCache for NoCache {
    fn is_cached(&self, _key: &str) -> bool {
        false
    }
}

/// Set of cached keys, filled by whoever downloads the resources.
#[derive(Default)]
pub struct InMemoryCache {
    keys: RwLock<HashSet<String>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: impl Into<String>) {
        match self.keys.write() {
            Ok(mut keys) => {
                keys.insert(key.into());
            }
            Err(e) => warn!("Cache lock poisoned: {}", e),
        }
    }

    pub fn evict(&self, key: &str) {
        match self.keys.write() {
            Ok(mut keys) => {
                keys.remove(key);
            }
            Err(e) => warn!("Cache lock poisoned: {}", e),
        }
    }
}

impl LocalityCache for InMemoryCache {
    fn is_cached(&self, key: &str) -> bool {
        self.keys.read().map(|keys| keys.contains(key)).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_evict() {
        let cache = InMemoryCache::new();
        assert!(!cache.is_cached("https://a.example/x.png"));

        cache.insert("https://a.example/x.png");
        assert!(cache.is_cached("https://a.example/x.png"));

        cache.evict("https://a.example/x.png");
        assert!(!cache.is_cached("https://a.example/x.png"));
        assert!(!NoCache.is_cached("anything"));
    }
}
