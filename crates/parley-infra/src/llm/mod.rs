//! Turn processor adapters.
//!
//! The production adapter speaks the OpenAI-compatible chat completions
//! protocol. The persistence subsystem treats it as an opaque collaborator:
//! history in, one assistant message out, no side effects on the stores.

pub mod openai_compat;

pub use openai_compat::{ChatTurnProcessor, ChatTurnProcessorConfig};
