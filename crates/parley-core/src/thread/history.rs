//! In-memory conversation history for one request.
//!
//! A `ThreadHistory` is rebuilt from the two-tier store on every request
//! and discarded afterwards. It carries the thread identifier, the replayed
//! window of prior messages, and the count of conversational messages
//! persisted before that window, so the total reachable count stays correct
//! even when the window is bounded.

use parley_types::message::{Message, MessageRole};
use uuid::Uuid;

/// The conversation history assembled for a single request.
#[derive(Debug, Clone)]
pub struct ThreadHistory {
    thread_id: Uuid,
    /// Conversational messages persisted before the replayed window.
    base_count: u32,
    messages: Vec<Message>,
}

impl ThreadHistory {
    /// A brand-new thread with a freshly generated identifier.
    pub fn new() -> Self {
        Self {
            thread_id: Uuid::now_v7(),
            base_count: 0,
            messages: Vec::new(),
        }
    }

    /// A thread resumed from persisted state.
    ///
    /// `base_count` is the number of persisted conversational messages NOT
    /// included in `messages` (those that fell outside the window).
    pub fn resumed(thread_id: Uuid, base_count: u32, messages: Vec<Message>) -> Self {
        Self {
            thread_id,
            base_count,
            messages,
        }
    }

    pub fn thread_id(&self) -> &Uuid {
        &self.thread_id
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn base_count(&self) -> u32 {
        self.base_count
    }

    /// Append a message produced during this request.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Conversational (user/assistant) messages currently in the window.
    pub fn window_count(&self) -> u32 {
        self.messages
            .iter()
            .filter(|m| m.role.is_conversational())
            .count() as u32
    }

    /// Total conversational message count reachable from this history:
    /// everything persisted before the window plus the window itself.
    pub fn total_count(&self) -> u32 {
        self.base_count + self.window_count()
    }

    /// Iterate over the conversational messages of the window, in order.
    pub fn conversational(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(|m| m.role.is_conversational())
    }

    /// (role, content) pairs of the conversational window, oldest first.
    pub fn transcript(&self) -> Vec<(MessageRole, String)> {
        self.conversational()
            .map(|m| (m.role, m.content.clone()))
            .collect()
    }
}

impl Default for ThreadHistory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_thread_is_empty() {
        let history = ThreadHistory::new();
        assert!(history.messages().is_empty());
        assert_eq!(history.total_count(), 0);
    }

    #[test]
    fn test_fresh_threads_get_distinct_ids() {
        assert_ne!(ThreadHistory::new().thread_id(), ThreadHistory::new().thread_id());
    }

    #[test]
    fn test_total_count_includes_base() {
        let mut history = ThreadHistory::resumed(
            Uuid::now_v7(),
            48,
            vec![Message::user("q"), Message::assistant("a")],
        );
        assert_eq!(history.total_count(), 50);

        history.push(Message::user("next"));
        assert_eq!(history.total_count(), 51);
    }

    #[test]
    fn test_info_messages_do_not_count() {
        let mut history = ThreadHistory::new();
        history.push(Message::user("q"));
        history.push(Message::info("retrieval context attached"));
        history.push(Message::assistant("a"));

        assert_eq!(history.total_count(), 2);
        assert_eq!(history.messages().len(), 3);
    }

    #[test]
    fn test_transcript_skips_info() {
        let mut history = ThreadHistory::new();
        history.push(Message::user("hello"));
        history.push(Message::info("note"));
        history.push(Message::assistant("hi"));

        let transcript = history.transcript();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[0].1, "hello");
        assert_eq!(transcript[1].1, "hi");
    }
}
