//! Turn state machine: `Idle -> Sending -> Streaming -> Settled`

use crate::store::ConversationState;
use futures::StreamExt;
use gemchat_core::config::{ChatConfig, DEFAULT_MODEL, DEFAULT_SYSTEM_INSTRUCTION};
use gemchat_core::{
    ChatBackend, ChatSession, Error, Message, Part, Result, Role, TextStream, UploadedImage,
};
use gemchat_telemetry::{TurnOutcomeKind, TurnSpanAttributes, trace_turn};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;

/// Banner shown when a send finds no usable session
pub const NOT_INITIALIZED: &str = "Chat is not initialized. Please check API key.";

/// Settings for the sessions a controller opens
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub model: String,
    pub system_instruction: String,
    /// Longest wait for the request or the next chunk; `None` waits forever
    pub turn_timeout: Option<Duration>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            system_instruction: DEFAULT_SYSTEM_INSTRUCTION.to_string(),
            turn_timeout: None,
        }
    }
}

impl SessionOptions {
    pub fn from_config(config: &ChatConfig) -> Self {
        Self {
            model: config.model.model_name.clone(),
            system_instruction: config.model.system_instruction.clone(),
            turn_timeout: config.chat.turn_timeout(),
        }
    }
}

/// How a sent turn ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The stream ended normally; `text` is the full reply
    Completed { message_id: String, text: String },
    /// The request or the stream failed; the model message now holds a notice
    Failed { message_id: String, error: String },
    /// A new chat started while the turn was in flight; nothing was written
    Discarded { message_id: String },
}

impl TurnOutcome {
    pub fn message_id(&self) -> &str {
        match self {
            TurnOutcome::Completed { message_id, .. }
            | TurnOutcome::Failed { message_id, .. }
            | TurnOutcome::Discarded { message_id } => message_id,
        }
    }

    fn kind(&self) -> TurnOutcomeKind {
        match self {
            TurnOutcome::Completed { .. } => TurnOutcomeKind::Completed,
            TurnOutcome::Failed { .. } => TurnOutcomeKind::Failed,
            TurnOutcome::Discarded { .. } => TurnOutcomeKind::Discarded,
        }
    }
}

/// Identity of one in-flight turn
#[derive(Debug, Clone)]
struct TurnTicket {
    generation: u64,
    target_id: String,
}

struct Shared {
    conversation: ConversationState,
    session: Option<Arc<dyn ChatSession>>,
    generation: u64,
    active_target: Option<String>,
}

impl Shared {
    fn is_current(&self, ticket: &TurnTicket) -> bool {
        self.generation == ticket.generation
            && self.active_target.as_deref() == Some(ticket.target_id.as_str())
    }
}

enum StreamEnd {
    Finished,
    Superseded,
}

/// Owns the conversation and drives one streamed turn at a time.
///
/// Share it behind an `Arc`: `send_turn` runs in its own task while the
/// presentation layer reads [`ChatController::snapshot`] whenever the
/// [`ChatController::subscribe`] revision changes, and may call
/// [`ChatController::start_new_chat`] at any point. Writes from a turn are
/// dropped once a newer chat has started.
pub struct ChatController {
    backend: Arc<dyn ChatBackend>,
    options: SessionOptions,
    shared: Mutex<Shared>,
    revision: watch::Sender<u64>,
}

impl ChatController {
    /// Create a controller and open its first session.
    ///
    /// A session that cannot be opened (missing credential) is reported in
    /// the state's `error`, not as a failure here.
    pub fn new(backend: Arc<dyn ChatBackend>, options: SessionOptions) -> Self {
        let (revision, _) = watch::channel(0);
        let controller = Self {
            backend,
            options,
            shared: Mutex::new(Shared {
                conversation: ConversationState::default(),
                session: None,
                generation: 0,
                active_target: None,
            }),
            revision,
        };
        let _ = controller.start_new_chat();
        controller
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Revision counter bumped after every state change
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    pub fn snapshot(&self) -> ConversationState {
        self.lock().conversation.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.lock().conversation.is_loading
    }

    /// Drop the current session and conversation and open a fresh session.
    ///
    /// Any turn still streaming from before becomes stale and stops writing.
    pub fn start_new_chat(&self) -> Result<()> {
        let result = {
            let mut shared = self.lock();
            shared.generation += 1;
            shared.active_target = None;
            shared.session = None;
            shared.conversation.reset();

            match self
                .backend
                .create_session(&self.options.model, &self.options.system_instruction)
            {
                Ok(session) => {
                    shared.session = Some(session);
                    tracing::info!(
                        backend = self.backend.name(),
                        model = %self.options.model,
                        generation = shared.generation,
                        "Started new chat"
                    );
                    Ok(())
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to initialize chat");
                    shared.conversation.error = Some(e.to_string());
                    Err(e)
                }
            }
        };
        self.notify();
        result
    }

    /// Send one user turn and stream the reply into the conversation.
    ///
    /// Returns `Err` only when the turn is rejected up front: nothing to send,
    /// another turn still loading, or no session could be opened. Failures
    /// after that are recorded in the conversation and reported as
    /// [`TurnOutcome::Failed`].
    pub async fn send_turn(&self, text: &str, image: Option<UploadedImage>) -> Result<TurnOutcome> {
        if text.trim().is_empty() && image.is_none() {
            return Err(Error::EmptyTurn);
        }

        let mut parts = Vec::with_capacity(2);
        if let Some(image) = &image {
            parts.push(image.to_part());
        }
        if !text.trim().is_empty() {
            parts.push(Part::text(text));
        }

        let begun = self.begin_turn(parts.clone());
        self.notify();
        let (session, ticket) = begun?;

        tracing::debug!(
            message_id = %ticket.target_id,
            generation = ticket.generation,
            parts = parts.len(),
            "Sending turn"
        );

        let mut reply = String::new();
        let mut chunk_count = 0;
        let streamed = self
            .stream_reply(session.as_ref(), parts, &ticket, &mut reply, &mut chunk_count)
            .await;

        let outcome = self.settle(&ticket, streamed, reply);
        self.notify();

        trace_turn(TurnSpanAttributes {
            system: self.backend.name().to_string(),
            model: session.model().to_string(),
            message_id: ticket.target_id.clone(),
            generation: ticket.generation,
            chunk_count,
            response_chars: match &outcome {
                TurnOutcome::Completed { text, .. } => text.chars().count(),
                _ => 0,
            },
            outcome: outcome.kind(),
        });

        Ok(outcome)
    }

    /// Sending: append the user message and the empty model placeholder
    fn begin_turn(&self, parts: Vec<Part>) -> Result<(Arc<dyn ChatSession>, TurnTicket)> {
        let mut shared = self.lock();

        if shared.conversation.is_loading {
            return Err(Error::Busy);
        }

        let session = match self.ensure_session(&mut shared) {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(error = %e, "No session available for send");
                shared.conversation.error = Some(NOT_INITIALIZED.to_string());
                return Err(e);
            }
        };

        let user = Message::new(Role::User, parts);
        let model = Message::new(Role::Model, vec![Part::text("")]);
        let ticket = TurnTicket {
            generation: shared.generation,
            target_id: model.id.clone(),
        };

        shared.conversation.store.append(user)?;
        shared.conversation.store.append(model)?;
        shared.conversation.is_loading = true;
        shared.conversation.error = None;
        shared.active_target = Some(ticket.target_id.clone());

        Ok((session, ticket))
    }

    fn ensure_session(&self, shared: &mut Shared) -> Result<Arc<dyn ChatSession>> {
        if let Some(session) = &shared.session {
            return Ok(session.clone());
        }

        let session = self
            .backend
            .create_session(&self.options.model, &self.options.system_instruction)?;
        shared.session = Some(session.clone());
        Ok(session)
    }

    /// Streaming: apply every fragment, in order, as the cumulative text
    async fn stream_reply(
        &self,
        session: &dyn ChatSession,
        parts: Vec<Part>,
        ticket: &TurnTicket,
        reply: &mut String,
        chunk_count: &mut usize,
    ) -> Result<StreamEnd> {
        let request = session.send_streaming(parts);
        let mut stream = match self.options.turn_timeout {
            Some(limit) => tokio::time::timeout(limit, request)
                .await
                .map_err(|_| timed_out(limit))??,
            None => request.await?,
        };

        while let Some(fragment) = self.next_fragment(&mut stream).await {
            reply.push_str(&fragment?);
            *chunk_count += 1;

            if !self.apply_text(ticket, reply) {
                return Ok(StreamEnd::Superseded);
            }
        }

        Ok(StreamEnd::Finished)
    }

    async fn next_fragment(&self, stream: &mut TextStream) -> Option<Result<String>> {
        match self.options.turn_timeout {
            Some(limit) => match tokio::time::timeout(limit, stream.next()).await {
                Ok(item) => item,
                Err(_) => Some(Err(timed_out(limit))),
            },
            None => stream.next().await,
        }
    }

    /// Replace the target's text if the turn is still current
    fn apply_text(&self, ticket: &TurnTicket, text: &str) -> bool {
        {
            let mut shared = self.lock();
            if !shared.is_current(ticket) {
                tracing::debug!(message_id = %ticket.target_id, "Ignoring chunk for stale turn");
                return false;
            }
            if let Err(e) = shared
                .conversation
                .store
                .update_by_id(&ticket.target_id, vec![Part::text(text)])
            {
                tracing::warn!(error = %e, "Streaming target missing from store");
                return false;
            }
        }
        self.notify();
        true
    }

    /// Settled: clear loading, or turn the failure into state
    fn settle(&self, ticket: &TurnTicket, streamed: Result<StreamEnd>, reply: String) -> TurnOutcome {
        let message_id = ticket.target_id.clone();
        let mut shared = self.lock();

        if !shared.is_current(ticket) {
            return TurnOutcome::Discarded { message_id };
        }

        shared.active_target = None;
        shared.conversation.is_loading = false;

        match streamed {
            Ok(StreamEnd::Finished) => {
                tracing::debug!(message_id = %message_id, chars = reply.len(), "Turn completed");
                TurnOutcome::Completed {
                    message_id,
                    text: reply,
                }
            }
            Ok(StreamEnd::Superseded) => TurnOutcome::Discarded { message_id },
            Err(e) => {
                tracing::error!(error = %e, message_id = %message_id, "Error sending message");
                shared.conversation.error = Some(format!("An error occurred: {}", e));
                let notice = format!("Sorry, something went wrong: {}", e);
                if let Err(missing) = shared
                    .conversation
                    .store
                    .update_by_id(&message_id, vec![Part::text(notice)])
                {
                    tracing::warn!(error = %missing, "Failed turn target missing from store");
                }
                TurnOutcome::Failed {
                    message_id,
                    error: e.to_string(),
                }
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self) {
        self.revision.send_modify(|revision| *revision = revision.wrapping_add(1));
    }
}

fn timed_out(limit: Duration) -> Error {
    Error::transport(format!("response stream timed out after {:?}", limit))
}
