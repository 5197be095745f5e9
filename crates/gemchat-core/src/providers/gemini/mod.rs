//! Google Gemini backend
//!
//! Streams replies from `streamGenerateContent` on the public Gemini API
//! using API key authentication.

pub mod auth;
pub mod provider;
pub mod types;

pub use auth::GeminiAuth;
pub use provider::GeminiChatSession;

use crate::config::{ChatConfig, DEFAULT_BASE_URL, MISSING_API_KEY};
use crate::providers::provider::{ChatBackend, ChatSession};
use crate::{Error, Result};
use reqwest::Client;
use std::sync::Arc;

/// Opens Gemini chat sessions.
///
/// The backend can be built without a credential so the caller can report
/// the missing key as state; [`ChatBackend::create_session`] is where that
/// becomes a [`Error::Config`].
pub struct GeminiBackend {
    client: Client,
    auth: Option<GeminiAuth>,
    base_url: String,
}

impl GeminiBackend {
    pub fn new(auth: Option<GeminiAuth>, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            auth,
            base_url: base_url.into(),
        }
    }

    /// Create a backend from loaded configuration
    pub fn from_config(config: &ChatConfig) -> Self {
        let auth = config.auth.api_key.as_deref().map(GeminiAuth::api_key);
        Self::new(auth, config.model.base_url.clone())
    }

    /// Create a backend for the public endpoint with an API key
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self::new(Some(GeminiAuth::api_key(api_key)), DEFAULT_BASE_URL)
    }

    pub fn has_credential(&self) -> bool {
        self.auth.is_some()
    }
}

impl ChatBackend for GeminiBackend {
    fn name(&self) -> &str {
        "gemini"
    }

    fn create_session(
        &self,
        model: &str,
        system_instruction: &str,
    ) -> Result<Arc<dyn ChatSession>> {
        let auth = self
            .auth
            .clone()
            .ok_or_else(|| Error::config_error(MISSING_API_KEY))?;

        if model.trim().is_empty() {
            return Err(Error::config_error(
                "Failed to initialize Gemini API: model name is empty",
            ));
        }

        tracing::debug!(model, "Creating Gemini chat session");

        Ok(Arc::new(GeminiChatSession::new(
            self.client.clone(),
            auth,
            &self.base_url,
            model,
            system_instruction,
        )))
    }
}
