use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use log::{debug, warn};
use lru::LruCache;
use tokio::sync::{Mutex, OnceCell, RwLock};
use tokio::time::Instant;

use super::retry::RetryPolicy;
use super::types::TokenSnapshot;
use super::MarketDataSource;

/// Freshness window for cached snapshots; entries older than this are
/// refetched, never served.
pub const SNAPSHOT_TTL: Duration = Duration::from_secs(15 * 60);

/// Uncached mints are fetched in chunks of this size to bound the number of
/// in-flight provider calls per batch.
pub const FETCH_BATCH_SIZE: usize = 100;

const CACHE_CAPACITY: usize = 10_000;

struct CacheEntry {
    snapshot: TokenSnapshot,
    fetched_at: Instant,
}

impl CacheEntry {
    fn is_live(&self, ttl: Duration) -> bool {
        self.fetched_at.elapsed() < ttl
    }
}

/// TTL-bounded snapshot cache in front of the market-data provider.
///
/// Shared by all concurrent pipeline runs; entries are last-writer-wins per
/// mint and never served once their freshness window has lapsed.
pub struct MarketDataCache {
    source: Arc<dyn MarketDataSource>,
    entries: RwLock<LruCache<String, CacheEntry>>,
    inflight: Mutex<HashMap<String, Arc<OnceCell<Option<TokenSnapshot>>>>>,
    ttl: Duration,
    retry: RetryPolicy,
}

impl MarketDataCache {
    pub fn new(source: Arc<dyn MarketDataSource>) -> Self {
        Self::with_ttl(source, SNAPSHOT_TTL)
    }

    pub fn with_ttl(source: Arc<dyn MarketDataSource>, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN);

        Self {
            source,
            entries: RwLock::new(LruCache::new(capacity)),
            inflight: Mutex::new(HashMap::new()),
            ttl,
            retry: RetryPolicy::default(),
        }
    }

    /// Resolve one mint, from cache when live, otherwise from the provider.
    /// `None` means the snapshot could not be obtained; the caller degrades
    /// its report instead of failing.
    pub async fn get(&self, mint: &str) -> Option<TokenSnapshot> {
        if let Some(snapshot) = self.cached(mint).await {
            return Some(snapshot);
        }
        self.fetch_shared(mint).await
    }

    /// Resolve a set of mints with one cache pass and chunked concurrent
    /// fetches for the misses. Mints that cannot be resolved are simply
    /// absent from the returned map.
    pub async fn get_many(&self, mints: &HashSet<String>) -> HashMap<String, TokenSnapshot> {
        let mut resolved = HashMap::new();
        let mut uncached = Vec::new();

        {
            let entries = self.entries.read().await;
            for mint in mints {
                match entries.peek(mint).filter(|entry| entry.is_live(self.ttl)) {
                    Some(entry) => {
                        resolved.insert(mint.clone(), entry.snapshot.clone());
                    }
                    None => uncached.push(mint.clone()),
                }
            }
        }

        debug!(
            "resolving {} mints ({} cached, {} to fetch)",
            mints.len(),
            resolved.len(),
            uncached.len()
        );

        for chunk in uncached.chunks(FETCH_BATCH_SIZE) {
            let fetches = chunk.iter().map(|mint| self.get(mint));
            let snapshots = join_all(fetches).await;

            for (mint, snapshot) in chunk.iter().zip(snapshots) {
                if let Some(snapshot) = snapshot {
                    resolved.insert(mint.clone(), snapshot);
                }
            }
        }

        resolved
    }

    /// Operational reset; not part of the steady-state protocol.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    async fn cached(&self, mint: &str) -> Option<TokenSnapshot> {
        let entries = self.entries.read().await;
        entries
            .peek(mint)
            .filter(|entry| entry.is_live(self.ttl))
            .map(|entry| entry.snapshot.clone())
    }

    /// Concurrent lookups for one mint share a single provider fetch.
    async fn fetch_shared(&self, mint: &str) -> Option<TokenSnapshot> {
        let cell = {
            let mut inflight = self.inflight.lock().await;
            inflight
                .entry(mint.to_string())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };

        let snapshot = cell.get_or_init(|| self.fetch_and_store(mint)).await.clone();

        let mut inflight = self.inflight.lock().await;
        inflight.remove(mint);

        snapshot
    }

    async fn fetch_and_store(&self, mint: &str) -> Option<TokenSnapshot> {
        match self.retry.run(|| self.source.fetch_overview(mint)).await {
            Ok(snapshot) => {
                let mut entries = self.entries.write().await;
                entries.put(
                    mint.to_string(),
                    CacheEntry {
                        snapshot: snapshot.clone(),
                        fetched_at: Instant::now(),
                    },
                );
                Some(snapshot)
            }
            Err(error) => {
                warn!("market data unavailable for {mint}: {error}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::error::MarketDataError;
    use crate::market::MockMarketDataSource;

    fn snapshot(mint: &str) -> TokenSnapshot {
        TokenSnapshot {
            mint: mint.to_string(),
            symbol: "TOK".to_string(),
            name: "Token".to_string(),
            price_usd: 1.25,
            ..TokenSnapshot::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn live_entry_is_served_without_a_second_fetch() {
        let mut source = MockMarketDataSource::new();
        source
            .expect_fetch_overview()
            .times(1)
            .returning(|mint| Ok(snapshot(mint)));

        let cache = MarketDataCache::new(Arc::new(source));

        let first = cache.get("mint-a").await;
        let second = cache.get("mint-a").await;

        assert!(first.is_some());
        assert_eq!(first, second);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entry_is_refetched() {
        let mut source = MockMarketDataSource::new();
        source
            .expect_fetch_overview()
            .times(2)
            .returning(|mint| Ok(snapshot(mint)));

        let cache = MarketDataCache::with_ttl(Arc::new(source), Duration::from_secs(60));

        assert!(cache.get("mint-a").await.is_some());
        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(cache.get("mint-a").await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failures_are_retried_until_success() {
        let mut source = MockMarketDataSource::new();
        let mut calls = 0;
        source
            .expect_fetch_overview()
            .times(3)
            .returning(move |mint| {
                calls += 1;
                if calls < 3 {
                    Err(MarketDataError::Status(503))
                } else {
                    Ok(snapshot(mint))
                }
            });

        let cache = MarketDataCache::new(Arc::new(source));
        assert!(cache.get("mint-a").await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_yield_not_found() {
        let mut source = MockMarketDataSource::new();
        source
            .expect_fetch_overview()
            .times(3)
            .returning(|_| Err(MarketDataError::Status(500)));

        let cache = MarketDataCache::new(Arc::new(source));
        assert!(cache.get("mint-a").await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_fetch_is_not_negatively_cached() {
        let mut source = MockMarketDataSource::new();
        let mut calls = 0;
        source.expect_fetch_overview().returning(move |mint| {
            calls += 1;
            if calls == 1 {
                Err(MarketDataError::Unsuccessful)
            } else {
                Ok(snapshot(mint))
            }
        });

        let cache = MarketDataCache::new(Arc::new(source));
        assert!(cache.get("mint-a").await.is_none());
        assert!(cache.get("mint-a").await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_lookups_share_one_fetch() {
        let mut source = MockMarketDataSource::new();
        source
            .expect_fetch_overview()
            .times(1)
            .returning(|mint| Ok(snapshot(mint)));

        let cache = MarketDataCache::new(Arc::new(source));

        let (first, second) = tokio::join!(cache.get("mint-a"), cache.get("mint-a"));
        assert!(first.is_some());
        assert_eq!(first, second);
    }

    #[tokio::test(start_paused = true)]
    async fn get_many_isolates_member_failures() {
        let mut source = MockMarketDataSource::new();
        source.expect_fetch_overview().returning(|mint| {
            if mint == "mint-bad" {
                Err(MarketDataError::Unsuccessful)
            } else {
                Ok(snapshot(mint))
            }
        });

        let cache = MarketDataCache::new(Arc::new(source));
        let mints: HashSet<String> = ["mint-a", "mint-bad", "mint-b"]
            .into_iter()
            .map(str::to_string)
            .collect();

        let resolved = cache.get_many(&mints).await;

        assert_eq!(resolved.len(), 2);
        assert!(resolved.contains_key("mint-a"));
        assert!(resolved.contains_key("mint-b"));
        assert!(!resolved.contains_key("mint-bad"));
    }

    #[tokio::test(start_paused = true)]
    async fn get_many_reuses_cached_entries() {
        let mut source = MockMarketDataSource::new();
        source
            .expect_fetch_overview()
            .times(2)
            .returning(|mint| Ok(snapshot(mint)));

        let cache = MarketDataCache::new(Arc::new(source));
        assert!(cache.get("mint-a").await.is_some());

        let mints: HashSet<String> = ["mint-a", "mint-b"]
            .into_iter()
            .map(str::to_string)
            .collect();
        let resolved = cache.get_many(&mints).await;

        assert_eq!(resolved.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn clear_evicts_everything() {
        let mut source = MockMarketDataSource::new();
        source
            .expect_fetch_overview()
            .times(2)
            .returning(|mint| Ok(snapshot(mint)));

        let cache = MarketDataCache::new(Arc::new(source));
        assert!(cache.get("mint-a").await.is_some());

        cache.clear().await;
        assert!(cache.get("mint-a").await.is_some());
    }
}
