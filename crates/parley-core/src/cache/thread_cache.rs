//! Typed, best-effort helpers over the raw [`CacheStore`].
//!
//! `ThreadCache` owns the JSON codec, the key namespacing, and the
//! swallow-and-log policy: a cache failure of any kind degrades to a miss
//! on read and to a no-op on write. Cache unavailability must never fail a
//! request.

use std::sync::Arc;
use std::time::Duration;

use parley_types::thread::{CachedMessage, CachedThreadInfo};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;
use uuid::Uuid;

use super::store::{
    CacheStore, DEFAULT_CACHE_TTL, DEFAULT_MESSAGE_WINDOW, thread_info_key, thread_msg_key,
};

/// Best-effort cache access for thread records.
pub struct ThreadCache<C> {
    store: Arc<C>,
    ttl: Duration,
    window: usize,
}

// Manual impl: `C` itself need not be Clone behind the Arc.
impl<C> Clone for ThreadCache<C> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            ttl: self.ttl,
            window: self.window,
        }
    }
}

impl<C: CacheStore> ThreadCache<C> {
    /// Create a cache helper with the reference TTL (3600s) and window (50).
    pub fn new(store: Arc<C>) -> Self {
        Self::with_limits(store, DEFAULT_CACHE_TTL, DEFAULT_MESSAGE_WINDOW)
    }

    /// Create a cache helper with explicit TTL and window bound.
    pub fn with_limits(store: Arc<C>, ttl: Duration, window: usize) -> Self {
        Self { store, ttl, window }
    }

    /// The recent-message window bound.
    pub fn window(&self) -> usize {
        self.window
    }

    /// Fetch a session's cached thread info. Any failure reads as a miss.
    pub async fn thread_info(&self, session_id: &str) -> Option<CachedThreadInfo> {
        self.read(&thread_info_key(session_id)).await
    }

    /// Overwrite a session's cached thread info. Fire-and-forget.
    pub async fn store_thread_info(&self, session_id: &str, info: &CachedThreadInfo) {
        self.write(&thread_info_key(session_id), info).await;
    }

    /// Fetch a thread's cached message window, truncated to the bound
    /// (most recent entries win). Any failure reads as a miss.
    pub async fn recent_messages(&self, thread_id: &Uuid) -> Option<Vec<CachedMessage>> {
        let mut messages: Vec<CachedMessage> = self.read(&thread_msg_key(thread_id)).await?;
        if messages.len() > self.window {
            messages.drain(..messages.len() - self.window);
        }
        Some(messages)
    }

    /// Overwrite a thread's cached message window, truncated to the bound.
    /// Fire-and-forget.
    pub async fn store_recent_messages(&self, thread_id: &Uuid, messages: &[CachedMessage]) {
        let start = messages.len().saturating_sub(self.window);
        self.write(&thread_msg_key(thread_id), &messages[start..])
            .await;
    }

    /// Append `delta` to a thread's cached message window and rewrite it,
    /// re-truncating to the bound. Fire-and-forget.
    pub async fn append_recent_messages(&self, thread_id: &Uuid, delta: &[CachedMessage]) {
        let mut window = self.recent_messages(thread_id).await.unwrap_or_default();
        window.extend_from_slice(delta);
        self.store_recent_messages(thread_id, &window).await;
    }

    async fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let bytes = match self.store.get(key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                warn!(key, error = %e, "cache read failed, treating as miss");
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "cache record undecodable, treating as miss");
                None
            }
        }
    }

    async fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        let bytes = match serde_json::to_vec(value) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(key, error = %e, "cache record unencodable, skipping write");
                return;
            }
        };

        if let Err(e) = self.store.set(key, bytes, self.ttl).await {
            warn!(key, error = %e, "cache write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_types::error::CacheError;
    use parley_types::message::MessageRole;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// In-memory store fake; flip `broken` to simulate an unavailable tier.
    #[derive(Default)]
    struct FakeStore {
        entries: Mutex<HashMap<String, Vec<u8>>>,
        broken: AtomicBool,
    }

    impl CacheStore for FakeStore {
        async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
            if self.broken.load(Ordering::SeqCst) {
                return Err(CacheError::Unavailable("broken".to_string()));
            }
            Ok(self.entries.lock().unwrap().get(key).cloned())
        }

        async fn set(&self, key: &str, value: Vec<u8>, _ttl: Duration) -> Result<(), CacheError> {
            if self.broken.load(Ordering::SeqCst) {
                return Err(CacheError::Unavailable("broken".to_string()));
            }
            self.entries.lock().unwrap().insert(key.to_string(), value);
            Ok(())
        }
    }

    fn cached(content: &str) -> CachedMessage {
        CachedMessage {
            role: MessageRole::User,
            content: content.to_string(),
            timestamp: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_thread_info_roundtrip() {
        let cache = ThreadCache::new(Arc::new(FakeStore::default()));
        let info = CachedThreadInfo {
            thread_id: Uuid::now_v7(),
            message_count: 4,
            last_updated: chrono::Utc::now(),
        };

        cache.store_thread_info("s1", &info).await;
        let got = cache.thread_info("s1").await.unwrap();
        assert_eq!(got, info);
    }

    #[tokio::test]
    async fn test_miss_returns_none() {
        let cache = ThreadCache::new(Arc::new(FakeStore::default()));
        assert!(cache.thread_info("unseen").await.is_none());
        assert!(cache.recent_messages(&Uuid::now_v7()).await.is_none());
    }

    #[tokio::test]
    async fn test_broken_store_reads_as_miss() {
        let store = Arc::new(FakeStore::default());
        let cache = ThreadCache::new(Arc::clone(&store));
        let info = CachedThreadInfo {
            thread_id: Uuid::now_v7(),
            message_count: 1,
            last_updated: chrono::Utc::now(),
        };
        cache.store_thread_info("s1", &info).await;

        store.broken.store(true, Ordering::SeqCst);
        assert!(cache.thread_info("s1").await.is_none());
        // Writes must not panic either.
        cache.store_thread_info("s1", &info).await;
    }

    #[tokio::test]
    async fn test_corrupt_record_reads_as_miss() {
        let store = Arc::new(FakeStore::default());
        let cache = ThreadCache::new(Arc::clone(&store));
        store
            .entries
            .lock()
            .unwrap()
            .insert("thread_info:s1".to_string(), b"{not json".to_vec());

        assert!(cache.thread_info("s1").await.is_none());
    }

    #[tokio::test]
    async fn test_window_truncated_on_read() {
        let store = Arc::new(FakeStore::default());
        let cache = ThreadCache::with_limits(Arc::clone(&store), DEFAULT_CACHE_TTL, 50);
        let thread_id = Uuid::now_v7();

        // Write 60 entries directly, bypassing the write-side truncation.
        let oversized: Vec<CachedMessage> = (0..60).map(|i| cached(&format!("m{i}"))).collect();
        store.entries.lock().unwrap().insert(
            thread_msg_key(&thread_id),
            serde_json::to_vec(&oversized).unwrap(),
        );

        let got = cache.recent_messages(&thread_id).await.unwrap();
        assert_eq!(got.len(), 50);
        assert_eq!(got.first().unwrap().content, "m10");
        assert_eq!(got.last().unwrap().content, "m59");
    }

    #[tokio::test]
    async fn test_append_re_truncates() {
        let cache = ThreadCache::with_limits(Arc::new(FakeStore::default()), DEFAULT_CACHE_TTL, 3);
        let thread_id = Uuid::now_v7();

        cache
            .store_recent_messages(&thread_id, &[cached("a"), cached("b"), cached("c")])
            .await;
        cache
            .append_recent_messages(&thread_id, &[cached("d"), cached("e")])
            .await;

        let got = cache.recent_messages(&thread_id).await.unwrap();
        let contents: Vec<&str> = got.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["c", "d", "e"]);
    }
}
