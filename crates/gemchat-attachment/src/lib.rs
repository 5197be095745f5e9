//! # gemchat Attachment
//!
//! Image intake for chat turns: size and type validation, base64 encoding off
//! the async runtime, and the single pending-attachment slot.

mod error;
mod intake;
mod slot;

pub use error::{AttachmentError, Result};
pub use intake::{SelectedFile, content_type_for, validate, validate_with_limit};
pub use slot::{AttachmentSlot, SelectionTicket};
