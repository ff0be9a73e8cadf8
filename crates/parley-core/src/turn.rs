//! Turn processor boundary.
//!
//! The turn processor is an external collaborator: it consumes the
//! assembled history plus the user's raw input and produces exactly one new
//! assistant-role message. It has no side effects on either store tier.
//! The production adapter lives in parley-infra.

use parley_types::error::TurnError;
use parley_types::message::Message;

use crate::thread::ThreadHistory;

/// Produces one assistant message per request.
pub trait TurnProcessor: Send + Sync {
    /// Respond to `input` given the prior conversation in `history`.
    ///
    /// The returned message carries `role = Assistant`, plain content, and
    /// an ordered sequence of content fragments.
    fn respond(
        &self,
        history: &ThreadHistory,
        input: &str,
    ) -> impl std::future::Future<Output = Result<Message, TurnError>> + Send;
}
