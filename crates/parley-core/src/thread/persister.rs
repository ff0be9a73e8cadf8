//! Thread persistence: commit only the newly added messages.
//!
//! The delta since the last known conversational count is computed from the
//! history, appended to the durable message log, and reflected into the
//! session's thread info record. The cache tier is refreshed afterwards on
//! a best-effort basis; a failed refresh self-heals on the next read via
//! cache-fill.

use std::sync::Arc;

use chrono::Utc;
use parley_types::error::ThreadError;
use parley_types::message::Message;
use parley_types::thread::{CachedMessage, CachedThreadInfo, ThreadInfo};
use tracing::{debug, info};

use crate::cache::{CacheStore, ThreadCache};

use super::history::ThreadHistory;
use super::repository::ThreadRepository;

/// Persists the new tail of a [`ThreadHistory`] to both tiers.
pub struct ThreadPersister<R, C> {
    repo: Arc<R>,
    cache: ThreadCache<C>,
}

impl<R: ThreadRepository, C: CacheStore> ThreadPersister<R, C> {
    pub fn new(repo: Arc<R>, cache: ThreadCache<C>) -> Self {
        Self { repo, cache }
    }

    /// Save the messages of `history` not yet reflected in the durable
    /// count. Returns the number of persisted messages (0 for a no-op).
    ///
    /// A durable write failure is fatal to the request and propagated; the
    /// save must not silently drop messages. Cache refresh failures are
    /// logged, not raised.
    pub async fn save_thread(
        &self,
        session_id: &str,
        history: &ThreadHistory,
    ) -> Result<u32, ThreadError> {
        let total_count = history.total_count();
        let existing_count = self.existing_count(session_id).await?;

        if total_count <= existing_count {
            // Re-entrant save, or a concurrent request already persisted
            // these messages.
            debug!(session_id, total_count, existing_count, "no new messages to save");
            return Ok(0);
        }

        let delta = self.collect_delta(history, existing_count);
        if !delta.is_empty() {
            self.repo
                .insert_messages(history.thread_id(), &delta)
                .await?;
        }

        let now = Utc::now();
        let info = ThreadInfo {
            session_id: session_id.to_string(),
            thread_id: *history.thread_id(),
            message_count: total_count,
            last_updated: now,
            // Insert-only field; ignored by the upsert once the record exists.
            created_at: now,
        };
        self.repo.upsert_info(&info).await?;

        self.refresh_cache(session_id, &info, &delta).await;

        info!(
            session_id,
            thread_id = %history.thread_id(),
            persisted = delta.len(),
            message_count = total_count,
            "thread saved"
        );
        Ok(delta.len() as u32)
    }

    /// Last known conversational count: cached thread info if present,
    /// else the durable record, defaulting to 0 for a first save.
    async fn existing_count(&self, session_id: &str) -> Result<u32, ThreadError> {
        if let Some(info) = self.cache.thread_info(session_id).await {
            return Ok(info.message_count);
        }
        let count = self
            .repo
            .find_info(session_id)
            .await?
            .map(|info| info.message_count)
            .unwrap_or(0);
        Ok(count)
    }

    /// Walk the history in order, skipping messages already covered by
    /// `existing_count`, and collect the remainder with their fragment
    /// sequences normalized for the wire.
    ///
    /// Only conversational messages advance the cursor; informational
    /// messages in the new tail are persisted but never counted.
    fn collect_delta(&self, history: &ThreadHistory, existing_count: u32) -> Vec<Message> {
        let skip = existing_count.saturating_sub(history.base_count());

        let mut seen = 0u32;
        let mut delta = Vec::new();
        for message in history.messages() {
            if seen < skip {
                if message.role.is_conversational() {
                    seen += 1;
                }
                continue;
            }
            delta.push(Message {
                items: message.wire_items(),
                ..message.clone()
            });
        }
        delta
    }

    /// Best-effort cache refresh: overwrite the info record and append the
    /// conversational part of the delta to the message window.
    async fn refresh_cache(&self, session_id: &str, info: &ThreadInfo, delta: &[Message]) {
        self.cache
            .store_thread_info(session_id, &CachedThreadInfo::from(info))
            .await;

        let cached_delta: Vec<CachedMessage> = delta
            .iter()
            .filter(|m| m.role.is_conversational())
            .map(CachedMessage::from)
            .collect();
        if !cached_delta.is_empty() {
            self.cache
                .append_recent_messages(&info.thread_id, &cached_delta)
                .await;
        }
    }
}
