//! ThreadRepository trait definition.
//!
//! The durable tier's query surface: thread info lookup/upsert and the
//! append-only message log. Implementations live in parley-infra (e.g.,
//! `SqliteThreadRepository`). Uses native async fn in traits (RPITIT,
//! Rust 2024 edition).

use parley_types::error::RepositoryError;
use parley_types::message::Message;
use parley_types::thread::ThreadInfo;
use uuid::Uuid;

/// Repository trait for thread bookkeeping and message persistence.
pub trait ThreadRepository: Send + Sync {
    /// Look up a session's thread info record.
    fn find_info(
        &self,
        session_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<ThreadInfo>, RepositoryError>> + Send;

    /// Upsert a session's thread info record.
    ///
    /// `message_count` and `last_updated` are always set; `thread_id` and
    /// `created_at` are insert-only and never overwritten once a record
    /// exists for the session.
    fn upsert_info(
        &self,
        info: &ThreadInfo,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Append a batch of messages to a thread's log, in the given order.
    ///
    /// The log is append-only: no update or delete operation exists.
    fn insert_messages(
        &self,
        thread_id: &Uuid,
        messages: &[Message],
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// The most recent `limit` conversational (user/assistant) messages of
    /// a thread, returned oldest-first.
    fn recent_messages(
        &self,
        thread_id: &Uuid,
        limit: u32,
    ) -> impl std::future::Future<Output = Result<Vec<Message>, RepositoryError>> + Send;
}
