//! Shared domain types for Parley.
//!
//! This crate contains the core domain types used across the Parley service:
//! messages and their content fragments, thread records, cache projections,
//! and the associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod error;
pub mod message;
pub mod thread;
