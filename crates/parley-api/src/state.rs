//! Application state wiring all services together.
//!
//! AppState holds the concrete service instances used by the REST API.
//! The core is generic over repository/cache/turn traits, but AppState
//! pins it to the concrete infra implementations chosen at startup.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use tracing::{info, warn};

use parley_core::cache::ThreadCache;
use parley_core::thread::{ThreadService, ThreadServiceConfig};
use parley_infra::cache::{CacheBackend, MemoryCache, RedisCache};
use parley_infra::cache::redis::DEFAULT_OP_TIMEOUT;
use parley_infra::llm::{ChatTurnProcessor, ChatTurnProcessorConfig};
use parley_infra::sqlite::pool::DatabasePool;
use parley_infra::sqlite::thread::SqliteThreadRepository;

/// Concrete type alias for the service generics pinned to infra implementations.
pub type ConcreteThreadService =
    ThreadService<SqliteThreadRepository, CacheBackend, ChatTurnProcessor>;

/// Everything AppState needs to wire itself up.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Data directory; the SQLite database lives at `<data_dir>/parley.db`.
    pub data_dir: PathBuf,
    /// Redis endpoint; `None` selects the in-process cache.
    pub redis_url: Option<String>,
    pub cache_ttl: Duration,
    pub cache_window: usize,
    /// Serialize the load-process-save span per session.
    pub serialize_sessions: bool,
    pub llm_base_url: String,
    pub llm_model: String,
    pub llm_api_key: Option<SecretString>,
}

/// Shared application state holding all services.
#[derive(Clone)]
pub struct AppState {
    pub thread_service: Arc<ConcreteThreadService>,
    pub thread_repo: Arc<SqliteThreadRepository>,
    pub cache_window: usize,
}

impl AppState {
    /// Initialize the application state: connect both tiers, wire services.
    ///
    /// Cache unavailability is logged and degrades to the in-process tier;
    /// it never prevents startup. A durable tier failure is fatal.
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(&config.data_dir).await?;

        let db_url = format!(
            "sqlite://{}?mode=rwc",
            config.data_dir.join("parley.db").display()
        );
        let db_pool = DatabasePool::new(&db_url).await?;
        let thread_repo = Arc::new(SqliteThreadRepository::new(db_pool));

        let cache_backend = Self::connect_cache(config.redis_url.as_deref()).await;
        match cache_backend.ping().await {
            Ok(()) => info!(backend = cache_backend.kind(), "cache tier ready"),
            Err(e) => warn!(
                backend = cache_backend.kind(),
                error = %e,
                "cache tier unreachable, requests will fall back to the durable tier"
            ),
        }

        let thread_cache = ThreadCache::with_limits(
            Arc::new(cache_backend),
            config.cache_ttl,
            config.cache_window,
        );

        let mut turn_config =
            ChatTurnProcessorConfig::new(config.llm_base_url, config.llm_model);
        if let Some(key) = config.llm_api_key {
            turn_config = turn_config.with_api_key(key);
        }
        let turn = Arc::new(ChatTurnProcessor::new(turn_config)?);

        let thread_service = ThreadService::new(
            Arc::clone(&thread_repo),
            thread_cache,
            turn,
            ThreadServiceConfig {
                serialize_sessions: config.serialize_sessions,
            },
        );

        Ok(Self {
            thread_service: Arc::new(thread_service),
            thread_repo,
            cache_window: config.cache_window,
        })
    }

    /// Pick the cache backend. A Redis endpoint that cannot be reached at
    /// startup degrades to the in-process tier with a warning rather than
    /// failing the boot.
    async fn connect_cache(redis_url: Option<&str>) -> CacheBackend {
        let Some(url) = redis_url else {
            return CacheBackend::Memory(MemoryCache::new());
        };

        match RedisCache::connect(url, DEFAULT_OP_TIMEOUT).await {
            Ok(cache) => CacheBackend::Redis(cache),
            Err(e) => {
                warn!(error = %e, "redis unavailable, using in-process cache");
                CacheBackend::Memory(MemoryCache::new())
            }
        }
    }
}

#[cfg(test)]
impl AppConfig {
    /// Defaults suitable for tests: temp-dir friendly, no Redis, LLM
    /// endpoint pointed at an unroutable local port.
    pub fn for_data_dir(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            redis_url: None,
            cache_ttl: Duration::from_secs(3600),
            cache_window: 50,
            serialize_sessions: false,
            llm_base_url: "http://127.0.0.1:9/v1".to_string(),
            llm_model: "test-model".to_string(),
            llm_api_key: None,
        }
    }
}
