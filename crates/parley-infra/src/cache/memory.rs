//! In-process implementation of `CacheStore`.
//!
//! A DashMap of byte values with per-key expiration and lazy deletion:
//! expired entries are dropped on the read that finds them. Used when no
//! Redis endpoint is configured, and by tests.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use parley_core::cache::CacheStore;
use parley_types::error::CacheError;

struct Entry {
    value: Vec<u8>,
    expires_at: Instant,
}

/// Thread-safe in-memory cache with per-key TTL.
#[derive(Default)]
pub struct MemoryCache {
    entries: DashMap<String, Entry>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (possibly expired, not yet collected) entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop expired entries eagerly. Returns the number removed.
    pub fn cleanup_expired(&self) -> usize {
        let before = self.entries.len();
        let now = Instant::now();
        self.entries.retain(|_, entry| entry.expires_at > now);
        before.saturating_sub(self.entries.len())
    }
}

impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let expired = match self.entries.get(key) {
            None => return Ok(None),
            Some(entry) => {
                if entry.expires_at > Instant::now() {
                    return Ok(Some(entry.value.clone()));
                }
                true
            }
        };

        if expired {
            // Lazy deletion: the read lock is released before removal.
            self.entries.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        self.entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }
}
