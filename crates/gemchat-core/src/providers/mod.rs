//! Chat backends
//!
//! A backend opens chat sessions; a session sends one user turn at a time and
//! returns the model's reply as a lazy stream of text fragments. Sessions keep
//! their own turn history, so every request carries the whole conversation.
//!
//! # Available Backends
//!
//! - **Gemini**: Google's Gemini models over `streamGenerateContent`
//!
//! # Example
//!
//! ```ignore
//! use futures::StreamExt;
//! use gemchat_core::{ChatBackend, ChatConfig, GeminiBackend, Part};
//!
//! let config = ChatConfig::load()?;
//! let backend = GeminiBackend::from_config(&config);
//! let session = backend.create_session(&config.model.model_name, &config.model.system_instruction)?;
//!
//! let mut stream = session.send_streaming(vec![Part::text("Hello")]).await?;
//! while let Some(fragment) = stream.next().await {
//!     print!("{}", fragment?);
//! }
//! ```

pub mod provider;

// Backend implementations
pub mod gemini;

// Re-exports
pub use provider::{ChatBackend, ChatSession, TextStream};

pub use gemini::{GeminiAuth, GeminiBackend, GeminiChatSession};
