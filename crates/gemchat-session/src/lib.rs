//! # gemchat Session
//!
//! Conversation state and the chat controller that streams model replies
//! into it.
//!
//! ```no_run
//! use gemchat_core::{ChatConfig, GeminiBackend};
//! use gemchat_session::{ChatController, SessionOptions};
//! use std::sync::Arc;
//!
//! # async fn run() -> gemchat_core::Result<()> {
//! let config = ChatConfig::load()?;
//! let backend = Arc::new(GeminiBackend::from_config(&config));
//! let controller = ChatController::new(backend, SessionOptions::from_config(&config));
//!
//! let outcome = controller.send_turn("Tell me a story", None).await?;
//! println!("{:?}", outcome);
//! # Ok(())
//! # }
//! ```

pub mod controller;
pub mod store;
pub mod testing;

pub use controller::{ChatController, NOT_INITIALIZED, SessionOptions, TurnOutcome};
pub use store::{ConversationState, MessageStore};
