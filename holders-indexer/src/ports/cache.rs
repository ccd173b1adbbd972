//! Caching port for in-memory data access.
//!
//! Defines the contract for caching the first page of a holders query to
//! absorb repeated reads against a hot token without hitting the database
//! on every request.

use crate::types::entities::HoldersPage;
use crate::types::primitives::EthAddress;

// ═══════════════════════════════════════════════════════════════════════════════
// HOLDERS CACHE
// ═══════════════════════════════════════════════════════════════════════════════

/// Port for caching the first page of a `(chain, token)` holders listing.
///
/// Only the cursor-less (first) page is cached: it is the only page with a
/// high-cardinality read pattern, and caching later pages would mean
/// tracking arbitrary cursors for little benefit.
///
/// # Cache Invalidation
///
/// Entries expire on a short TTL (default 2s) rather than being
/// explicitly invalidated on write — the holder store commits faster than
/// most clients re-poll, so a short TTL bounds staleness without the
/// Chain Poller needing to know about the cache at all.
///
/// # Implementation Notes
///
/// Implementations should be thread-safe (this trait requires
/// `Send + Sync`).
pub trait HoldersCache: Send + Sync {
    /// Get the cached first page for `(chain_id, token)`, if present and
    /// not expired.
    fn get(&self, chain_id: u64, token: &EthAddress) -> Option<HoldersPage>;

    /// Cache the first page for `(chain_id, token)`.
    fn set(&self, chain_id: u64, token: &EthAddress, page: HoldersPage);

    /// Drop the cached entry for `(chain_id, token)`, if any.
    fn invalidate(&self, chain_id: u64, token: &EthAddress);

    /// Get cache statistics for monitoring.
    fn stats(&self) -> CacheStats;
}

/// Cache statistics for monitoring.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Number of entries currently cached.
    pub entry_count: u64,
}

impl CacheStats {
    /// Calculate the cache hit rate as a percentage.
    ///
    /// Precision loss in f64 conversion is acceptable for statistics.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[allow(clippy::significant_drop_tightening)]
pub mod mocks {
    //! Mock implementations for testing.

    use std::collections::HashMap;
    use std::sync::RwLock;
    use std::sync::atomic::{AtomicU64, Ordering};

    use super::{CacheStats, EthAddress, HoldersCache, HoldersPage};

    /// Simple in-memory cache for testing, with no TTL expiry.
    #[derive(Debug, Default)]
    pub struct MockHoldersCache {
        entries: RwLock<HashMap<(u64, EthAddress), HoldersPage>>,
        hits: AtomicU64,
        misses: AtomicU64,
    }

    impl MockHoldersCache {
        /// Create a new mock cache.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl HoldersCache for MockHoldersCache {
        fn get(&self, chain_id: u64, token: &EthAddress) -> Option<HoldersPage> {
            let entries = self.entries.read().expect("lock poisoned");
            match entries.get(&(chain_id, *token)) {
                Some(page) => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    Some(page.clone())
                }
                None => {
                    self.misses.fetch_add(1, Ordering::Relaxed);
                    None
                }
            }
        }

        fn set(&self, chain_id: u64, token: &EthAddress, page: HoldersPage) {
            let mut entries = self.entries.write().expect("lock poisoned");
            entries.insert((chain_id, *token), page);
        }

        fn invalidate(&self, chain_id: u64, token: &EthAddress) {
            let mut entries = self.entries.write().expect("lock poisoned");
            entries.remove(&(chain_id, *token));
        }

        fn stats(&self) -> CacheStats {
            CacheStats {
                hits: self.hits.load(Ordering::Relaxed),
                misses: self.misses.load(Ordering::Relaxed),
                entry_count: self.entries.read().expect("lock poisoned").len() as u64,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mocks::MockHoldersCache;
    use super::*;
    use crate::types::entities::Holder;
    use crate::types::primitives::TokenAmount;

    fn sample_page() -> HoldersPage {
        HoldersPage {
            items: vec![Holder {
                holder: EthAddress::ZERO,
                balance: TokenAmount::parse("100").expect("valid amount"),
                rank: 1,
                pct: "100".to_string(),
            }],
            next_cursor: None,
            status: "ok".to_string(),
        }
    }

    #[test]
    fn cache_stats_hit_rate() {
        let stats = CacheStats {
            hits: 80,
            misses: 20,
            entry_count: 10,
        };
        assert!((stats.hit_rate() - 80.0).abs() < f64::EPSILON);
    }

    #[test]
    fn cache_stats_hit_rate_zero() {
        let stats = CacheStats::default();
        assert!((stats.hit_rate() - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn mock_cache_set_then_get_hits() {
        let cache = MockHoldersCache::new();
        let token = EthAddress::ZERO;

        assert!(cache.get(1, &token).is_none());
        cache.set(1, &token, sample_page());
        assert_eq!(cache.get(1, &token), Some(sample_page()));
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn mock_cache_invalidate() {
        let cache = MockHoldersCache::new();
        let token = EthAddress::ZERO;

        cache.set(1, &token, sample_page());
        cache.invalidate(1, &token);
        assert!(cache.get(1, &token).is_none());
    }
}
