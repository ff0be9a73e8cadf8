//! Thread records and their cache-tier projections.
//!
//! A thread is the durable, ordered log of messages belonging to one
//! session. `ThreadInfo` is the durable tier's bookkeeping record (one per
//! session); `CachedThreadInfo` and `CachedMessage` are the derived,
//! expendable projections held by the cache tier. The durable tier owns the
//! authoritative copy -- cache records are only ever populated from it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::message::{Message, MessageRole};

/// Durable bookkeeping record for one session's thread.
///
/// `thread_id` and `created_at` are assigned once, on first save, and are
/// never overwritten. `message_count` counts persisted conversational
/// (user/assistant) messages and is monotonically non-decreasing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadInfo {
    pub session_id: String,
    pub thread_id: Uuid,
    pub message_count: u32,
    pub last_updated: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Cache projection of [`ThreadInfo`], minus `created_at`.
///
/// Addressed by `thread_info:{session_id}` with a short TTL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedThreadInfo {
    pub thread_id: Uuid,
    pub message_count: u32,
    pub last_updated: DateTime<Utc>,
}

impl From<&ThreadInfo> for CachedThreadInfo {
    fn from(info: &ThreadInfo) -> Self {
        Self {
            thread_id: info.thread_id,
            message_count: info.message_count,
            last_updated: info.last_updated,
        }
    }
}

/// One entry of the cached recent-message window.
///
/// Addressed by `thread_msg:{thread_id}`; stores only role, content, and
/// timestamp -- content fragments stay in the durable tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedMessage {
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl From<&Message> for CachedMessage {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
            timestamp: message.timestamp,
        }
    }
}

impl CachedMessage {
    /// Rehydrate into a [`Message`] for context replay.
    ///
    /// The cached window drops content fragments, so the result carries
    /// none; that matches what is replayed into conversational context.
    pub fn into_message(self) -> Message {
        Message {
            role: self.role,
            content: self.content,
            items: Vec::new(),
            timestamp: self.timestamp,
        }
    }
}
