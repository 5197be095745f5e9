//! Gemini authentication

use reqwest::RequestBuilder;
use std::fmt;

/// API key authentication for generativelanguage.googleapis.com
#[derive(Clone)]
pub struct GeminiAuth {
    api_key: String,
}

impl GeminiAuth {
    pub fn api_key(key: impl Into<String>) -> Self {
        Self {
            api_key: key.into(),
        }
    }

    /// Apply authentication to a request builder
    pub fn apply(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.query(&[("key", self.api_key.as_str())])
    }
}

impl fmt::Debug for GeminiAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiAuth")
            .field("api_key", &"<redacted>")
            .finish()
    }
}
