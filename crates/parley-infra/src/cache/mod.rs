//! Cache tier implementations.
//!
//! `RedisCache` is the deployment-grade tier; `MemoryCache` is an
//! in-process TTL store for cache-less deployments and tests. Both
//! implement `CacheStore` from `parley-core`, and `CacheBackend` selects
//! between them at startup.

pub mod memory;
pub mod redis;

pub use memory::MemoryCache;
pub use redis::RedisCache;

use std::time::Duration;

use parley_core::cache::CacheStore;
use parley_types::error::CacheError;

/// Runtime-selected cache tier.
pub enum CacheBackend {
    Redis(RedisCache),
    Memory(MemoryCache),
}

impl CacheBackend {
    /// Probe the tier, for the startup health log.
    pub async fn ping(&self) -> Result<(), CacheError> {
        match self {
            CacheBackend::Redis(cache) => cache.ping().await,
            CacheBackend::Memory(_) => Ok(()),
        }
    }

    /// Human-readable backend name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            CacheBackend::Redis(_) => "redis",
            CacheBackend::Memory(_) => "memory",
        }
    }
}

impl CacheStore for CacheBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        match self {
            CacheBackend::Redis(cache) => cache.get(key).await,
            CacheBackend::Memory(cache) => cache.get(key).await,
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        match self {
            CacheBackend::Redis(cache) => cache.set(key, value, ttl).await,
            CacheBackend::Memory(cache) => cache.set(key, value, ttl).await,
        }
    }
}
