//! SQLite thread repository implementation.
//!
//! Implements `ThreadRepository` from `parley-core` using sqlx with split
//! read/write pools: raw queries, private Row structs, reader pool for
//! lookups and writer pool for the append-only message log.

use chrono::{DateTime, Utc};
use parley_core::thread::ThreadRepository;
use parley_types::error::RepositoryError;
use parley_types::message::{ContentItem, Message, MessageRole};
use parley_types::thread::ThreadInfo;
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `ThreadRepository`.
pub struct SqliteThreadRepository {
    pool: DatabasePool,
}

impl SqliteThreadRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct ThreadRow {
    session_id: String,
    thread_id: String,
    message_count: i64,
    last_updated: String,
    created_at: String,
}

impl ThreadRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            session_id: row.try_get("session_id")?,
            thread_id: row.try_get("thread_id")?,
            message_count: row.try_get("message_count")?,
            last_updated: row.try_get("last_updated")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_info(self) -> Result<ThreadInfo, RepositoryError> {
        let thread_id = Uuid::parse_str(&self.thread_id)
            .map_err(|e| RepositoryError::Query(format!("invalid thread_id: {e}")))?;
        let last_updated = parse_datetime(&self.last_updated)?;
        let created_at = parse_datetime(&self.created_at)?;

        Ok(ThreadInfo {
            session_id: self.session_id,
            thread_id,
            message_count: self.message_count as u32,
            last_updated,
            created_at,
        })
    }
}

struct MessageRow {
    role: String,
    content: String,
    items: String,
    timestamp: String,
}

impl MessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            role: row.try_get("role")?,
            content: row.try_get("content")?,
            items: row.try_get("items")?,
            timestamp: row.try_get("timestamp")?,
        })
    }

    fn into_message(self) -> Result<Message, RepositoryError> {
        let role: MessageRole = self
            .role
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;
        let timestamp = parse_datetime(&self.timestamp)?;

        Ok(Message {
            role,
            content: self.content,
            // Total decode: unknown fragment kinds degrade to opaque.
            items: ContentItem::parse_items(&self.items),
            timestamp,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

// ---------------------------------------------------------------------------
// ThreadRepository implementation
// ---------------------------------------------------------------------------

impl ThreadRepository for SqliteThreadRepository {
    async fn find_info(&self, session_id: &str) -> Result<Option<ThreadInfo>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM threads WHERE session_id = ?")
            .bind(session_id)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let thread_row =
                    ThreadRow::from_row(&row).map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(thread_row.into_info()?))
            }
            None => Ok(None),
        }
    }

    async fn upsert_info(&self, info: &ThreadInfo) -> Result<(), RepositoryError> {
        // thread_id and created_at are insert-only: the conflict branch
        // never touches them.
        sqlx::query(
            r#"INSERT INTO threads (session_id, thread_id, message_count, last_updated, created_at)
               VALUES (?, ?, ?, ?, ?)
               ON CONFLICT (session_id) DO UPDATE SET
                   message_count = excluded.message_count,
                   last_updated = excluded.last_updated"#,
        )
        .bind(&info.session_id)
        .bind(info.thread_id.to_string())
        .bind(info.message_count as i64)
        .bind(format_datetime(&info.last_updated))
        .bind(format_datetime(&info.created_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn insert_messages(
        &self,
        thread_id: &Uuid,
        messages: &[Message],
    ) -> Result<(), RepositoryError> {
        // Individual inserts, no surrounding transaction: a failed batch may
        // be partially applied, and a retried save must tolerate that
        // (at-least-once semantics on the append-only log).
        for message in messages {
            let items = serde_json::to_string(&message.items)
                .map_err(|e| RepositoryError::Query(format!("failed to encode items: {e}")))?;

            sqlx::query(
                r#"INSERT INTO messages (id, thread_id, role, content, items, timestamp)
                   VALUES (?, ?, ?, ?, ?, ?)"#,
            )
            .bind(Uuid::now_v7().to_string())
            .bind(thread_id.to_string())
            .bind(message.role.to_string())
            .bind(&message.content)
            .bind(items)
            .bind(format_datetime(&message.timestamp))
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        }

        Ok(())
    }

    async fn recent_messages(
        &self,
        thread_id: &Uuid,
        limit: u32,
    ) -> Result<Vec<Message>, RepositoryError> {
        // Newest N conversational messages; v7 message ids break timestamp
        // ties so the order is stable within a batch.
        let rows = sqlx::query(
            r#"SELECT role, content, items, timestamp FROM messages
               WHERE thread_id = ? AND role IN ('user', 'assistant')
               ORDER BY timestamp DESC, id DESC
               LIMIT ?"#,
        )
        .bind(thread_id.to_string())
        .bind(limit as i64)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut messages = Vec::with_capacity(rows.len());
        for row in &rows {
            let message_row =
                MessageRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
            messages.push(message_row.into_message()?);
        }

        // Descending fetch, ascending presentation.
        messages.reverse();
        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::pool::DatabasePool;

    async fn test_pool() -> DatabasePool {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        std::mem::forget(dir);
        DatabasePool::new(&url).await.unwrap()
    }

    fn info(session_id: &str, thread_id: Uuid, count: u32) -> ThreadInfo {
        ThreadInfo {
            session_id: session_id.to_string(),
            thread_id,
            message_count: count,
            last_updated: Utc::now(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_find_info_nonexistent_returns_none() {
        let repo = SqliteThreadRepository::new(test_pool().await);
        let got = repo.find_info("missing").await.unwrap();
        assert!(got.is_none());
    }

    #[tokio::test]
    async fn test_upsert_roundtrip() {
        let repo = SqliteThreadRepository::new(test_pool().await);
        let thread_id = Uuid::now_v7();

        repo.upsert_info(&info("s1", thread_id, 2)).await.unwrap();

        let got = repo.find_info("s1").await.unwrap().unwrap();
        assert_eq!(got.session_id, "s1");
        assert_eq!(got.thread_id, thread_id);
        assert_eq!(got.message_count, 2);
    }

    #[tokio::test]
    async fn test_upsert_preserves_insert_only_fields() {
        let repo = SqliteThreadRepository::new(test_pool().await);
        let thread_id = Uuid::now_v7();

        let first = info("s1", thread_id, 2);
        repo.upsert_info(&first).await.unwrap();
        let created = repo.find_info("s1").await.unwrap().unwrap();

        // Second upsert with a different thread id and creation time must
        // only move the count and last_updated.
        repo.upsert_info(&info("s1", Uuid::now_v7(), 4)).await.unwrap();

        let got = repo.find_info("s1").await.unwrap().unwrap();
        assert_eq!(got.thread_id, thread_id);
        assert_eq!(got.created_at, created.created_at);
        assert_eq!(got.message_count, 4);
    }

    #[tokio::test]
    async fn test_insert_and_fetch_ordered() {
        let repo = SqliteThreadRepository::new(test_pool().await);
        let thread_id = Uuid::now_v7();

        let batch = vec![
            Message::user("one"),
            Message::assistant("two"),
            Message::user("three"),
        ];
        repo.insert_messages(&thread_id, &batch).await.unwrap();

        let got = repo.recent_messages(&thread_id, 50).await.unwrap();
        let contents: Vec<&str> = got.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["one", "two", "three"]);
    }

    #[tokio::test]
    async fn test_recent_messages_limit_keeps_newest() {
        let repo = SqliteThreadRepository::new(test_pool().await);
        let thread_id = Uuid::now_v7();

        let batch: Vec<Message> = (0..6).map(|i| Message::user(format!("m{i}"))).collect();
        repo.insert_messages(&thread_id, &batch).await.unwrap();

        let got = repo.recent_messages(&thread_id, 4).await.unwrap();
        let contents: Vec<&str> = got.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["m2", "m3", "m4", "m5"]);
    }

    #[tokio::test]
    async fn test_recent_messages_excludes_info_role() {
        let repo = SqliteThreadRepository::new(test_pool().await);
        let thread_id = Uuid::now_v7();

        repo.insert_messages(
            &thread_id,
            &[
                Message::user("q"),
                Message::info("context attached"),
                Message::assistant("a"),
            ],
        )
        .await
        .unwrap();

        let got = repo.recent_messages(&thread_id, 50).await.unwrap();
        assert_eq!(got.len(), 2);
        assert!(got.iter().all(|m| m.role.is_conversational()));
    }

    #[tokio::test]
    async fn test_threads_are_isolated() {
        let repo = SqliteThreadRepository::new(test_pool().await);
        let thread_a = Uuid::now_v7();
        let thread_b = Uuid::now_v7();

        repo.insert_messages(&thread_a, &[Message::user("from a")])
            .await
            .unwrap();
        repo.insert_messages(&thread_b, &[Message::user("from b")])
            .await
            .unwrap();

        let got = repo.recent_messages(&thread_a, 50).await.unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].content, "from a");
    }

    #[tokio::test]
    async fn test_items_roundtrip() {
        let repo = SqliteThreadRepository::new(test_pool().await);
        let thread_id = Uuid::now_v7();

        let mut message = Message::assistant("with tool output");
        message.items = vec![
            ContentItem::Text {
                text: "with tool output".to_string(),
            },
            ContentItem::ToolResult {
                name: Some("weather".to_string()),
                result: serde_json::json!({"temp": 21}),
            },
        ];
        repo.insert_messages(&thread_id, &[message.clone()])
            .await
            .unwrap();

        let got = repo.recent_messages(&thread_id, 50).await.unwrap();
        assert_eq!(got[0].items, message.items);
    }

    #[tokio::test]
    async fn test_unknown_item_kind_degrades_to_opaque() {
        let pool = test_pool().await;
        let repo = SqliteThreadRepository::new(pool.clone());
        let thread_id = Uuid::now_v7();

        // Simulate a row written by a newer producer with an unknown kind.
        sqlx::query(
            r#"INSERT INTO messages (id, thread_id, role, content, items, timestamp)
               VALUES (?, ?, 'assistant', 'hi', ?, ?)"#,
        )
        .bind(Uuid::now_v7().to_string())
        .bind(thread_id.to_string())
        .bind(r#"[{"kind": "diagram", "nodes": 7}]"#)
        .bind(Utc::now().to_rfc3339())
        .execute(&pool.writer)
        .await
        .unwrap();

        let got = repo.recent_messages(&thread_id, 50).await.unwrap();
        match &got[0].items[0] {
            ContentItem::Opaque { data } => {
                assert!(!data.is_empty());
                assert!(data.contains("diagram"));
            }
            other => panic!("expected opaque fallback, got {other:?}"),
        }
    }
}
