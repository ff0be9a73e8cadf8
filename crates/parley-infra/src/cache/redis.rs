//! Redis-backed implementation of `CacheStore`.
//!
//! Every operation runs under a bounded timeout: a slow or unreachable
//! Redis reads as a cache failure, never as a hung request. The connection
//! manager reconnects on its own between commands.

use std::time::Duration;

use parley_core::cache::CacheStore;
use parley_types::error::CacheError;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use tracing::info;

/// Default bound on a single cache operation (connect or command).
pub const DEFAULT_OP_TIMEOUT: Duration = Duration::from_secs(2);

/// Redis cache tier handle. Cheap to clone.
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
    op_timeout: Duration,
}

impl RedisCache {
    /// Connect to the Redis endpoint at `url` (e.g. `redis://127.0.0.1/`).
    ///
    /// The initial connection is itself bounded by `op_timeout`.
    pub async fn connect(url: &str, op_timeout: Duration) -> Result<Self, CacheError> {
        let client =
            redis::Client::open(url).map_err(|e| CacheError::Unavailable(e.to_string()))?;

        let conn = tokio::time::timeout(op_timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| CacheError::Timeout)?
            .map_err(|e| CacheError::Unavailable(e.to_string()))?;

        info!(url, "connected to redis cache tier");
        Ok(Self { conn, op_timeout })
    }

    /// Round-trip a PING, for the startup probe.
    pub async fn ping(&self) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let pong = tokio::time::timeout(
            self.op_timeout,
            redis::cmd("PING").query_async::<String>(&mut conn),
        )
        .await
        .map_err(|_| CacheError::Timeout)?
        .map_err(|e| CacheError::Unavailable(e.to_string()))?;

        if pong == "PONG" {
            Ok(())
        } else {
            Err(CacheError::Unavailable(format!("unexpected ping reply: {pong}")))
        }
    }
}

impl CacheStore for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let mut conn = self.conn.clone();
        tokio::time::timeout(self.op_timeout, conn.get::<_, Option<Vec<u8>>>(key))
            .await
            .map_err(|_| CacheError::Timeout)?
            .map_err(|e| CacheError::Unavailable(e.to_string()))
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let seconds = ttl.as_secs().max(1);
        tokio::time::timeout(self.op_timeout, conn.set_ex::<_, _, ()>(key, value, seconds))
            .await
            .map_err(|_| CacheError::Timeout)?
            .map_err(|e| CacheError::Unavailable(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_url_rejected() {
        let err = redis::Client::open("not a url");
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn test_connect_to_unreachable_endpoint_fails_fast() {
        // Nothing listens on this port; the error variant depends on how
        // the OS refuses, but the call must return within the bound.
        let result = RedisCache::connect(
            "redis://127.0.0.1:1/",
            Duration::from_millis(250),
        )
        .await;
        assert!(result.is_err());
    }
}
