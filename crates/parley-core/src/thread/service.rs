//! Request orchestration: load thread, run the turn processor, save.
//!
//! `ThreadService` wires the assembler, the turn processor, and the
//! persister into the per-request control flow. All handles are injected at
//! construction; the service itself keeps no per-session state beyond the
//! optional lock registry.

use std::sync::Arc;

use dashmap::DashMap;
use parley_types::error::ThreadError;
use parley_types::message::{Message, MessageRole};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use crate::cache::{CacheStore, ThreadCache};
use crate::turn::TurnProcessor;

use super::assembler::ThreadAssembler;
use super::history::ThreadHistory;
use super::persister::ThreadPersister;
use super::repository::ThreadRepository;

/// Tuning knobs for [`ThreadService`].
#[derive(Debug, Clone, Default)]
pub struct ThreadServiceConfig {
    /// Serialize the load-process-save span per session.
    ///
    /// Off by default: the documented baseline is last-writer-wins on the
    /// count with an append-only log. Enabling this closes the concurrent
    /// same-session race at the cost of queueing those requests.
    pub serialize_sessions: bool,
}

/// Keyed async-mutex registry for the optional per-session critical section.
///
/// Entries are created on first contact and retained; the map is bounded by
/// the number of distinct sessions seen by this process.
#[derive(Clone, Default)]
struct SessionLocks {
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl SessionLocks {
    async fn acquire(&self, session_id: &str) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }
}

/// Per-request orchestration over the persistence subsystem.
pub struct ThreadService<R, C, T> {
    assembler: ThreadAssembler<R, C>,
    persister: ThreadPersister<R, C>,
    turn: Arc<T>,
    locks: Option<SessionLocks>,
}

impl<R, C, T> ThreadService<R, C, T>
where
    R: ThreadRepository,
    C: CacheStore,
    T: TurnProcessor,
{
    pub fn new(
        repo: Arc<R>,
        cache: ThreadCache<C>,
        turn: Arc<T>,
        config: ThreadServiceConfig,
    ) -> Self {
        Self {
            assembler: ThreadAssembler::new(Arc::clone(&repo), cache.clone()),
            persister: ThreadPersister::new(repo, cache),
            turn,
            locks: config.serialize_sessions.then(SessionLocks::default),
        }
    }

    /// Handle one request/response cycle for a session.
    ///
    /// Assembles the thread, runs the turn processor, persists the new
    /// user/assistant pair, and returns the assistant's content.
    pub async fn handle_turn(
        &self,
        session_id: &str,
        user_text: &str,
    ) -> Result<String, ThreadError> {
        let session_id = session_id.trim();
        if session_id.is_empty() {
            return Err(ThreadError::InvalidSession(
                "session id must be non-empty".to_string(),
            ));
        }

        let _guard = match &self.locks {
            Some(locks) => Some(locks.acquire(session_id).await),
            None => None,
        };

        let mut history = self.assembler.load_thread(session_id).await?;
        debug!(
            session_id,
            thread_id = %history.thread_id(),
            prior = history.messages().len(),
            "handling turn"
        );

        let user_message = Message::user(user_text);
        let reply = self.turn.respond(&history, user_text).await?;
        let reply_content = reply.content.clone();

        history.push(user_message);
        // The boundary contract fixes the role regardless of what the
        // processor set.
        history.push(Message {
            role: MessageRole::Assistant,
            ..reply
        });

        self.persister.save_thread(session_id, &history).await?;
        Ok(reply_content)
    }

    /// Reconstruct a session's history without producing a turn.
    pub async fn load_thread(&self, session_id: &str) -> Result<ThreadHistory, ThreadError> {
        self.assembler.load_thread(session_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thread::test_support::{MemoryCacheStore, MemoryThreadRepository};
    use parley_types::error::TurnError;

    /// Replies with a canned transformation of the input.
    struct EchoTurn;

    impl TurnProcessor for EchoTurn {
        async fn respond(&self, _history: &ThreadHistory, input: &str) -> Result<Message, TurnError> {
            Ok(Message::assistant(format!("echo: {input}")))
        }
    }

    /// Always fails, for error-path tests.
    struct FailingTurn;

    impl TurnProcessor for FailingTurn {
        async fn respond(&self, _history: &ThreadHistory, _input: &str) -> Result<Message, TurnError> {
            Err(TurnError::Provider {
                message: "upstream down".to_string(),
            })
        }
    }

    fn service(
        repo: Arc<MemoryThreadRepository>,
        store: Arc<MemoryCacheStore>,
        serialize_sessions: bool,
    ) -> ThreadService<MemoryThreadRepository, MemoryCacheStore, EchoTurn> {
        ThreadService::new(
            repo,
            ThreadCache::new(store),
            Arc::new(EchoTurn),
            ThreadServiceConfig { serialize_sessions },
        )
    }

    #[tokio::test]
    async fn test_turn_persists_user_and_assistant_pair() {
        let repo = Arc::new(MemoryThreadRepository::default());
        let store = Arc::new(MemoryCacheStore::default());
        let service = service(Arc::clone(&repo), store, false);

        let reply = service.handle_turn("s1", "hello").await.unwrap();

        assert_eq!(reply, "echo: hello");
        let info = repo.info("s1").unwrap();
        assert_eq!(info.message_count, 2);
        let stored = repo.stored_messages(&info.thread_id);
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].role, MessageRole::User);
        assert_eq!(stored[0].content, "hello");
        assert_eq!(stored[1].role, MessageRole::Assistant);
        assert_eq!(stored[1].content, "echo: hello");
    }

    #[tokio::test]
    async fn test_roundtrip_preserves_transcript_across_requests() {
        let repo = Arc::new(MemoryThreadRepository::default());
        let store = Arc::new(MemoryCacheStore::default());
        let service = service(Arc::clone(&repo), Arc::clone(&store), false);

        service.handle_turn("s1", "first").await.unwrap();
        service.handle_turn("s1", "second").await.unwrap();

        // Cold cache: the durable tier alone must reconstruct the same
        // ordered transcript.
        store.clear();
        let history = service.load_thread("s1").await.unwrap();
        let contents: Vec<String> = history.transcript().into_iter().map(|(_, c)| c).collect();
        assert_eq!(contents, vec!["first", "echo: first", "second", "echo: second"]);
        assert_eq!(history.total_count(), 4);
    }

    #[tokio::test]
    async fn test_empty_session_id_rejected() {
        let repo = Arc::new(MemoryThreadRepository::default());
        let store = Arc::new(MemoryCacheStore::default());
        let service = service(repo, store, false);

        let err = service.handle_turn("   ", "hello").await.unwrap_err();
        assert!(matches!(err, ThreadError::InvalidSession(_)));
    }

    #[tokio::test]
    async fn test_turn_failure_leaves_stores_untouched() {
        let repo = Arc::new(MemoryThreadRepository::default());
        let store = Arc::new(MemoryCacheStore::default());
        let service = ThreadService::new(
            Arc::clone(&repo),
            ThreadCache::new(Arc::clone(&store)),
            Arc::new(FailingTurn),
            ThreadServiceConfig::default(),
        );

        assert!(service.handle_turn("s1", "hello").await.is_err());
        assert!(repo.infos.lock().unwrap().is_empty());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_serialized_concurrent_turns_keep_count_consistent() {
        let repo = Arc::new(MemoryThreadRepository::default());
        let store = Arc::new(MemoryCacheStore::default());
        let service = Arc::new(service(Arc::clone(&repo), store, true));

        let mut handles = Vec::new();
        for i in 0..4 {
            let service = Arc::clone(&service);
            handles.push(tokio::spawn(async move {
                service.handle_turn("s1", &format!("msg {i}")).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let info = repo.info("s1").unwrap();
        assert_eq!(info.message_count, 8);
        assert_eq!(repo.stored_messages(&info.thread_id).len(), 8);
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let repo = Arc::new(MemoryThreadRepository::default());
        let store = Arc::new(MemoryCacheStore::default());
        let service = service(Arc::clone(&repo), store, false);

        service.handle_turn("alpha", "hi").await.unwrap();
        service.handle_turn("beta", "yo").await.unwrap();

        let alpha = repo.info("alpha").unwrap();
        let beta = repo.info("beta").unwrap();
        assert_ne!(alpha.thread_id, beta.thread_id);
        assert_eq!(alpha.message_count, 2);
        assert_eq!(beta.message_count, 2);
    }
}
