//! Backend and session trait definitions

use crate::{Content, Part, Result};
use async_trait::async_trait;
use futures::stream::Stream;
use std::sync::Arc;

/// Ordered, finite, non-restartable sequence of text fragments.
///
/// A transport failure is delivered as a single `Err` item, after which the
/// stream yields nothing more.
pub type TextStream = Box<dyn Stream<Item = Result<String>> + Send + Unpin>;

/// Factory for chat sessions against one hosted model endpoint
pub trait ChatBackend: Send + Sync {
    /// Short identifier used in logs (e.g. "gemini")
    fn name(&self) -> &str;

    /// Open a fresh session with no history.
    ///
    /// Fails with [`crate::Error::Config`] when the backend has no usable
    /// credential.
    fn create_session(
        &self,
        model: &str,
        system_instruction: &str,
    ) -> Result<Arc<dyn ChatSession>>;
}

/// One conversation with the model
#[async_trait]
pub trait ChatSession: Send + Sync {
    /// Model this session talks to
    fn model(&self) -> &str;

    /// Send one user turn and stream the reply.
    ///
    /// Returns `Err` when the request cannot be issued or is rejected before
    /// any text arrives. Once the stream completes normally the turn becomes
    /// part of the session history.
    async fn send_streaming(&self, parts: Vec<Part>) -> Result<TextStream>;

    /// Completed turns, oldest first
    fn history(&self) -> Vec<Content>;
}
