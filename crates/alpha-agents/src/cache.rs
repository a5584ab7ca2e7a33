//! TTL caches in front of the market-data APIs

use crate::api::PriceBar;
use crate::config::AlphaConfig;
use cached::{Cached, TimedCache};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Cache key for a data request
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Stock symbol
    pub symbol: String,
    /// API endpoint or operation type
    pub endpoint: String,
    /// Request parameters, serialized
    pub params: String,
}

impl CacheKey {
    /// Create a new cache key
    pub fn new(symbol: impl Into<String>, endpoint: impl Into<String>, params: impl Serialize) -> Self {
        Self {
            symbol: symbol.into().to_uppercase(),
            endpoint: endpoint.into(),
            params: serde_json::to_string(&params).unwrap_or_default(),
        }
    }
}

/// Shared TTL cache
///
/// Clones share the same storage.
pub struct StockCache<V = serde_json::Value> {
    cache: Arc<RwLock<TimedCache<CacheKey, V>>>,
}

impl<V> Clone for StockCache<V> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
        }
    }
}

impl<V: Clone> StockCache<V> {
    /// Create a new cache whose entries live for `ttl`
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Arc::new(RwLock::new(TimedCache::with_lifespan(ttl))),
        }
    }

    /// Get a value if present and not expired
    pub async fn get(&self, key: &CacheKey) -> Option<V> {
        // TimedCache evicts on read, so a read needs the write lock
        let mut cache = self.cache.write().await;
        cache.cache_get(key).cloned()
    }

    /// Insert a value
    pub async fn insert(&self, key: CacheKey, value: V) {
        let mut cache = self.cache.write().await;
        let _ = cache.cache_set(key, value);
    }

    /// Return the cached value, or run `fetcher` and cache what it returns
    ///
    /// Errors are not cached.
    pub async fn get_or_fetch<F, Fut, E>(&self, key: CacheKey, fetcher: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(&key).await {
            tracing::debug!(symbol = %key.symbol, endpoint = %key.endpoint, "Cache hit");
            return Ok(value);
        }

        tracing::debug!(symbol = %key.symbol, endpoint = %key.endpoint, "Cache miss");
        let value = fetcher().await?;
        self.insert(key, value.clone()).await;
        Ok(value)
    }

    /// Invalidate a specific cache entry
    pub async fn invalidate(&self, key: &CacheKey) {
        let mut cache = self.cache.write().await;
        let _ = cache.cache_remove(key);
    }

    /// Clear all cached entries
    pub async fn clear(&self) {
        let mut cache = self.cache.write().await;
        cache.cache_clear();
    }

    /// Number of stored entries, including any not yet evicted
    pub async fn len(&self) -> usize {
        self.cache.read().await.cache_size()
    }

    /// Check if the cache is empty
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// The three cache tiers used by the data clients
#[derive(Clone)]
pub struct CacheManager {
    /// Daily price history
    pub prices: StockCache<Vec<PriceBar>>,
    /// Financial metrics, company profiles, filings
    pub fundamentals: StockCache,
    /// Company news
    pub news: StockCache,
}

impl CacheManager {
    /// Create a cache manager with the given TTLs
    pub fn new(prices_ttl: Duration, fundamentals_ttl: Duration, news_ttl: Duration) -> Self {
        Self {
            prices: StockCache::new(prices_ttl),
            fundamentals: StockCache::new(fundamentals_ttl),
            news: StockCache::new(news_ttl),
        }
    }

    /// Create a cache manager with the TTLs from `config`
    pub fn from_config(config: &AlphaConfig) -> Self {
        Self::new(
            config.cache_ttl_prices,
            config.cache_ttl_fundamentals,
            config.cache_ttl_news,
        )
    }

    /// Clear all caches
    pub async fn clear_all(&self) {
        self.prices.clear().await;
        self.fundamentals.clear().await;
        self.news.clear().await;
    }
}
