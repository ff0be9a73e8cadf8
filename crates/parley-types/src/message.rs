//! Message and content fragment types for Parley.
//!
//! A message is one turn of a conversation thread: a role, plain-text
//! content, and an ordered sequence of typed content fragments. Messages are
//! immutable once written; the thread log is append-only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// Role of a message within a thread.
///
/// Only `User` and `Assistant` messages participate in conversational
/// context and count toward a thread's message tally. `Info` marks
/// system-tagged informational records that may be written to the log but
/// are never replayed into context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    Info,
}

impl MessageRole {
    /// Whether this role participates in conversational context.
    pub fn is_conversational(&self) -> bool {
        matches!(self, MessageRole::User | MessageRole::Assistant)
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
            MessageRole::Info => write!(f, "info"),
        }
    }
}

impl FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            "info" => Ok(MessageRole::Info),
            other => Err(format!("invalid message role: '{other}'")),
        }
    }
}

/// A typed content fragment within a message.
///
/// The set of kinds is closed: the turn processor boundary decides the
/// variant once, and everything downstream matches exhaustively. Payloads
/// that fit no specific kind are carried as `Opaque` with a string
/// rendering, so fragment handling is total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentItem {
    /// Plain text.
    Text { text: String },
    /// Structured result of a tool or function invocation.
    ToolResult {
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        result: serde_json::Value,
    },
    /// Fallback for any payload with no specific mapping.
    Opaque { data: String },
}

impl ContentItem {
    /// Decode a single fragment from a JSON value.
    ///
    /// Total: a value that does not match any known kind tag degrades to
    /// an `Opaque` fragment carrying the raw JSON text, so decoding never
    /// fails and unknown kinds still round-trip as non-empty string data.
    pub fn from_value(value: serde_json::Value) -> Self {
        match serde_json::from_value::<ContentItem>(value.clone()) {
            Ok(item) => item,
            Err(_) => ContentItem::Opaque {
                data: value.to_string(),
            },
        }
    }

    /// Decode a fragment sequence from its JSON text representation.
    ///
    /// Total in the same way as [`ContentItem::from_value`]: malformed JSON
    /// degrades to a single `Opaque` fragment carrying the raw text.
    pub fn parse_items(json: &str) -> Vec<ContentItem> {
        match serde_json::from_str::<Vec<serde_json::Value>>(json) {
            Ok(values) => values.into_iter().map(ContentItem::from_value).collect(),
            Err(_) => vec![ContentItem::Opaque {
                data: json.to_string(),
            }],
        }
    }
}

/// A single message within a conversation thread.
///
/// The owning `thread_id` is carried separately by the repository surface;
/// a message itself is just role + content + fragments + timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
    pub items: Vec<ContentItem>,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a user message with plain content and no fragments.
    pub fn user(content: impl Into<String>) -> Self {
        Self::plain(MessageRole::User, content)
    }

    /// Create an assistant message with plain content and no fragments.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::plain(MessageRole::Assistant, content)
    }

    /// Create an informational message with plain content and no fragments.
    pub fn info(content: impl Into<String>) -> Self {
        Self::plain(MessageRole::Info, content)
    }

    fn plain(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            items: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    /// The fragment sequence as it goes to the wire.
    ///
    /// A message with no structured fragments is represented as a single
    /// text fragment carrying its plain content, so the persisted form
    /// always has at least one fragment.
    pub fn wire_items(&self) -> Vec<ContentItem> {
        if self.items.is_empty() {
            vec![ContentItem::Text {
                text: self.content.clone(),
            }]
        } else {
            self.items.clone()
        }
    }
}
