//! Observability for Parley: tracing subscriber setup and span attribute
//! conventions.

pub mod attrs;
pub mod tracing_setup;
