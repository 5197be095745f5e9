//! Shared test utilities for session testing
//!
//! [`MockBackend`] opens sessions that answer from a queue of scripted
//! replies, so controller behavior can be exercised without a network.

use async_stream::stream;
use async_trait::async_trait;
use futures::channel::mpsc;
use gemchat_core::{ChatBackend, ChatSession, Content, Error, Part, Result, TextStream};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// One scripted answer to `send_streaming`
enum ScriptedReply {
    /// Yield these fragments, then end (or fail) the stream
    Fragments {
        fragments: Vec<String>,
        error: Option<String>,
    },
    /// Fail the request before any stream exists
    Rejection(String),
    /// Forward whatever the test sends; the stream ends when the sender drops
    Channel(mpsc::UnboundedReceiver<Result<String>>),
}

#[derive(Default)]
struct MockState {
    replies: Mutex<VecDeque<ScriptedReply>>,
    sent: Mutex<Vec<Vec<Part>>>,
    session_failure: Mutex<Option<String>>,
    sessions_created: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mock chat backend for testing
///
/// Every session it opens draws from the same reply queue, in order.
#[derive(Default)]
pub struct MockBackend {
    state: Arc<MockState>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply that streams `fragments` and completes
    pub fn push_reply(&self, fragments: &[&str]) {
        self.push(ScriptedReply::Fragments {
            fragments: fragments.iter().map(|f| f.to_string()).collect(),
            error: None,
        });
    }

    /// Queue a reply that streams `fragments` and then fails with `error`
    pub fn push_failure(&self, fragments: &[&str], error: &str) {
        self.push(ScriptedReply::Fragments {
            fragments: fragments.iter().map(|f| f.to_string()).collect(),
            error: Some(error.to_string()),
        });
    }

    /// Queue a request that fails before streaming
    pub fn push_rejection(&self, error: &str) {
        self.push(ScriptedReply::Rejection(error.to_string()));
    }

    /// Queue a reply driven by the test through the returned sender
    pub fn push_channel(&self) -> mpsc::UnboundedSender<Result<String>> {
        let (tx, rx) = mpsc::unbounded();
        self.push(ScriptedReply::Channel(rx));
        tx
    }

    /// Make `create_session` fail with a configuration error, or succeed again with `None`
    pub fn fail_session_creation(&self, message: Option<&str>) {
        *lock(&self.state.session_failure) = message.map(str::to_string);
    }

    pub fn sessions_created(&self) -> usize {
        self.state.sessions_created.load(Ordering::SeqCst)
    }

    /// Parts of every turn sent so far, across sessions
    pub fn sent_turns(&self) -> Vec<Vec<Part>> {
        lock(&self.state.sent).clone()
    }

    fn push(&self, reply: ScriptedReply) {
        lock(&self.state.replies).push_back(reply);
    }
}

impl ChatBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    fn create_session(&self, model: &str, _system_instruction: &str) -> Result<Arc<dyn ChatSession>> {
        if let Some(message) = lock(&self.state.session_failure).clone() {
            return Err(Error::config_error(message));
        }

        self.state.sessions_created.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(MockSession {
            state: self.state.clone(),
            model: model.to_string(),
            history: Arc::new(Mutex::new(Vec::new())),
        }))
    }
}

struct MockSession {
    state: Arc<MockState>,
    model: String,
    history: Arc<Mutex<Vec<Content>>>,
}

#[async_trait]
impl ChatSession for MockSession {
    fn model(&self) -> &str {
        &self.model
    }

    async fn send_streaming(&self, parts: Vec<Part>) -> Result<TextStream> {
        lock(&self.state.sent).push(parts.clone());

        let reply = lock(&self.state.replies)
            .pop_front()
            .ok_or_else(|| Error::transport("no scripted reply left"))?;

        match reply {
            ScriptedReply::Rejection(message) => Err(Error::transport(message)),
            ScriptedReply::Channel(rx) => Ok(Box::new(rx)),
            ScriptedReply::Fragments { fragments, error } => {
                let history = self.history.clone();
                Ok(Box::new(Box::pin(stream! {
                    let mut reply = String::new();
                    for fragment in fragments {
                        reply.push_str(&fragment);
                        yield Ok(fragment);
                    }
                    match error {
                        Some(message) => {
                            yield Err(Error::transport(message));
                        }
                        None => {
                            let mut history = lock(&history);
                            history.push(Content::new_user(parts));
                            history.push(Content::new_model_text(reply));
                        }
                    }
                })))
            }
        }
    }

    fn history(&self) -> Vec<Content> {
        lock(&self.history).clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_scripted_reply_records_history() {
        let backend = MockBackend::new();
        backend.push_reply(&["a", "b"]);
        let session = backend.create_session("mock-model", "").unwrap();

        let stream = session.send_streaming(vec![Part::text("hi")]).await.unwrap();
        let fragments: Vec<String> = stream.map(|r| r.unwrap()).collect().await;

        assert_eq!(fragments, vec!["a", "b"]);
        assert_eq!(session.history().len(), 2);
        assert_eq!(backend.sent_turns(), vec![vec![Part::text("hi")]]);
    }

    #[tokio::test]
    async fn test_empty_queue_is_transport_error() {
        let backend = MockBackend::new();
        let session = backend.create_session("mock-model", "").unwrap();

        assert!(matches!(
            session.send_streaming(vec![Part::text("hi")]).await,
            Err(Error::Transport(_))
        ));
    }

    #[test]
    fn test_session_failure_toggle() {
        let backend = MockBackend::new();
        backend.fail_session_creation(Some("no key"));
        assert!(backend.create_session("m", "").is_err());

        backend.fail_session_creation(None);
        assert!(backend.create_session("m", "").is_ok());
        assert_eq!(backend.sessions_created(), 1);
    }
}
