//! Infrastructure layer for Parley.
//!
//! Contains implementations of the ports defined in `parley-core`: the
//! SQLite durable tier, the Redis and in-process cache tiers, and the
//! OpenAI-compatible turn processor adapter.

pub mod cache;
pub mod llm;
pub mod sqlite;
