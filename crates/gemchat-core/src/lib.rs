//! Core types for gemchat
//!
//! This crate provides the conversation data model, the error taxonomy, the
//! configuration loader and the streaming chat backends.

pub mod config;
pub mod content;
pub mod error;
pub mod providers;

// Re-exports
pub use config::ChatConfig;
pub use content::{Content, InlineData, Message, Part, Role, UploadedImage};
pub use error::{Error, Result};
pub use providers::{ChatBackend, ChatSession, GeminiBackend, TextStream};
