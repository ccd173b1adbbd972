//! In-memory TTL cache for the first page of a holders listing.
//!
//! Backed by `dashmap` rather than a dedicated cache crate: the working
//! set is one entry per `(chain, token)` pair with a uniform TTL, which a
//! plain map with a stored expiry timestamp covers without pulling in a
//! policy engine built for per-entry eviction curves.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::ports::{CacheStats, HoldersCache};
use crate::types::entities::HoldersPage;
use crate::types::primitives::EthAddress;

/// Default time a cached first page stays valid.
const DEFAULT_TTL: Duration = Duration::from_secs(2);

struct Entry {
    page: HoldersPage,
    expires_at: Instant,
}

/// Dashmap-backed cache for the cursor-less first page of a holders query.
#[derive(Debug)]
pub struct TtlHoldersCache {
    entries: DashMap<(u64, EthAddress), Entry>,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl TtlHoldersCache {
    /// Create a cache with the default 2-second TTL.
    #[must_use]
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    /// Create a cache with a custom TTL, for tests that need tighter control.
    #[must_use]
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }
}

impl Default for TtlHoldersCache {
    fn default() -> Self {
        Self::new()
    }
}

impl HoldersCache for TtlHoldersCache {
    fn get(&self, chain_id: u64, token: &EthAddress) -> Option<HoldersPage> {
        let key = (chain_id, *token);
        match self.entries.get(&key) {
            Some(entry) if entry.expires_at > Instant::now() => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.page.clone())
            }
            Some(_) => {
                drop(self.entries.remove(&key));
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    fn set(&self, chain_id: u64, token: &EthAddress, page: HoldersPage) {
        self.entries.insert(
            (chain_id, *token),
            Entry {
                page,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    fn invalidate(&self, chain_id: u64, token: &EthAddress) {
        drop(self.entries.remove(&(chain_id, *token)));
    }

    fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entry_count: self.entries.len() as u64,
        }
    }
}
