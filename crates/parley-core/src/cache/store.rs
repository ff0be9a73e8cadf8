//! CacheStore trait definition and key namespacing.
//!
//! Implementations live in parley-infra (e.g., `RedisCache`, `MemoryCache`).
//! Uses native async fn in traits (RPITIT, Rust 2024 edition).

use std::time::Duration;

use parley_types::error::CacheError;
use uuid::Uuid;

/// Default TTL for cache records.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

/// Default bound on the cached recent-message window.
pub const DEFAULT_MESSAGE_WINDOW: usize = 50;

/// Byte-oriented key-value cache with per-key expiration.
///
/// Both operations are fallible at the transport level; callers in this
/// crate swallow and log those failures, so an implementation should
/// surface them honestly (including bounded timeouts) rather than block.
pub trait CacheStore: Send + Sync {
    /// Fetch the value stored at `key`, if present and not expired.
    fn get(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = Result<Option<Vec<u8>>, CacheError>> + Send;

    /// Store `value` at `key`, expiring after `ttl`.
    fn set(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Duration,
    ) -> impl std::future::Future<Output = Result<(), CacheError>> + Send;
}

/// Key for a session's cached thread info record.
pub fn thread_info_key(session_id: &str) -> String {
    format!("thread_info:{session_id}")
}

/// Key for a thread's cached recent-message window.
///
/// Deliberately disjoint from [`thread_info_key`] so a thread's message
/// window can be warmed independently of its info record.
pub fn thread_msg_key(thread_id: &Uuid) -> String {
    format!("thread_msg:{thread_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_namespaces_disjoint() {
        let thread_id = Uuid::now_v7();
        let info_key = thread_info_key(&thread_id.to_string());
        let msg_key = thread_msg_key(&thread_id);
        assert!(info_key.starts_with("thread_info:"));
        assert!(msg_key.starts_with("thread_msg:"));
        assert_ne!(info_key, msg_key);
    }

    #[test]
    fn test_thread_info_key_embeds_session() {
        assert_eq!(thread_info_key("abc123"), "thread_info:abc123");
    }
}
