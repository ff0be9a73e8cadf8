//! Business logic and port definitions for Parley.
//!
//! This crate defines the "ports" (repository, cache, and turn processor
//! traits) that the infrastructure layer implements, plus the stateless
//! thread assembly/persistence logic built on top of them. It depends only
//! on `parley-types` -- never on `parley-infra` or any database/IO crate.

pub mod cache;
pub mod thread;
pub mod turn;
