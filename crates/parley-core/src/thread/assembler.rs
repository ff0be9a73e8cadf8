//! Thread assembly: rebuild a session's conversation history per request.
//!
//! Consults the cache tier first, then the durable tier, filling cache gaps
//! as a by-product. A never-seen session yields a valid empty thread with a
//! freshly generated id and no write to either tier -- the durable record
//! is created lazily on first save.

use std::sync::Arc;

use parley_types::error::ThreadError;
use parley_types::thread::{CachedMessage, CachedThreadInfo};
use tracing::debug;
use uuid::Uuid;

use crate::cache::{CacheStore, ThreadCache};

use super::history::ThreadHistory;
use super::repository::ThreadRepository;

/// Reconstructs a [`ThreadHistory`] for a session at the start of a request.
pub struct ThreadAssembler<R, C> {
    repo: Arc<R>,
    cache: ThreadCache<C>,
}

impl<R: ThreadRepository, C: CacheStore> ThreadAssembler<R, C> {
    pub fn new(repo: Arc<R>, cache: ThreadCache<C>) -> Self {
        Self { repo, cache }
    }

    /// Rebuild the conversation history for `session_id`.
    ///
    /// Never fails for a missing session; a durable-tier read failure is
    /// propagated so a fetch error is not mistaken for a new session. May
    /// perform up to two fire-and-forget cache fills.
    pub async fn load_thread(&self, session_id: &str) -> Result<ThreadHistory, ThreadError> {
        // Thread info: cache, then durable tier. The cached thread_id is
        // trusted because cache records only ever originate from durable
        // data -- they are never invented independently.
        let (thread_id, message_count) = match self.cache.thread_info(session_id).await {
            Some(info) => (info.thread_id, info.message_count),
            None => match self.repo.find_info(session_id).await? {
                None => {
                    let history = ThreadHistory::new();
                    debug!(session_id, thread_id = %history.thread_id(), "new session, starting empty thread");
                    return Ok(history);
                }
                Some(info) => {
                    self.cache
                        .store_thread_info(session_id, &CachedThreadInfo::from(&info))
                        .await;
                    (info.thread_id, info.message_count)
                }
            },
        };

        let messages = self.load_window(&thread_id).await?;
        let replayed: Vec<_> = messages
            .into_iter()
            .filter(|m| m.role.is_conversational())
            .map(CachedMessage::into_message)
            .collect();

        let base_count = message_count.saturating_sub(replayed.len() as u32);
        debug!(
            session_id,
            thread_id = %thread_id,
            replayed = replayed.len(),
            base_count,
            "thread assembled"
        );

        Ok(ThreadHistory::resumed(thread_id, base_count, replayed))
    }

    /// Recent-message window: cache, then durable tier with cache-fill.
    async fn load_window(&self, thread_id: &Uuid) -> Result<Vec<CachedMessage>, ThreadError> {
        if let Some(cached) = self.cache.recent_messages(thread_id).await {
            if !cached.is_empty() {
                return Ok(cached);
            }
        }

        let from_db = self
            .repo
            .recent_messages(thread_id, self.cache.window() as u32)
            .await?;
        let window: Vec<CachedMessage> = from_db.iter().map(CachedMessage::from).collect();

        if !window.is_empty() {
            self.cache.store_recent_messages(thread_id, &window).await;
        }

        Ok(window)
    }
}
