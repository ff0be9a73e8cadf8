//! Stateless conversation-thread assembly and persistence.
//!
//! No component here holds cross-request state: the assembler reconstructs
//! a thread from the two-tier store at the start of a request, and the
//! persister commits only the newly added messages after the turn processor
//! has produced its reply. Every invocation is self-contained given the
//! session identifier.

pub mod assembler;
pub mod history;
pub mod persister;
pub mod repository;
pub mod service;

pub use assembler::ThreadAssembler;
pub use history::ThreadHistory;
pub use persister::ThreadPersister;
pub use repository::ThreadRepository;
pub use service::{ThreadService, ThreadServiceConfig};
