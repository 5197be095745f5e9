//! Gemini chat session implementation

use super::{auth::GeminiAuth, types::*};
use crate::providers::provider::{ChatSession, TextStream};
use crate::{Content, Error, Part, Result};
use async_stream::stream;
use async_trait::async_trait;
use futures::stream::StreamExt;
use reqwest::Client;
use std::sync::{Arc, Mutex, PoisonError};

/// A Gemini conversation that remembers its completed turns
pub struct GeminiChatSession {
    client: Client,
    auth: GeminiAuth,
    url: String,
    model: String,
    system_instruction: Option<SystemInstruction>,
    history: Arc<Mutex<Vec<Content>>>,
}

impl GeminiChatSession {
    pub fn new(
        client: Client,
        auth: GeminiAuth,
        base_url: &str,
        model: &str,
        system_instruction: &str,
    ) -> Self {
        Self {
            client,
            auth,
            url: format!(
                "{}/{}:streamGenerateContent",
                base_url.trim_end_matches('/'),
                model
            ),
            model: model.to_string(),
            system_instruction: SystemInstruction::from_text(system_instruction),
            history: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn build_request(&self, user: &Content) -> GeminiRequest {
        let mut contents = self
            .history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        contents.push(user.clone());

        GeminiRequest {
            contents,
            system_instruction: self.system_instruction.clone(),
        }
    }
}

#[async_trait]
impl ChatSession for GeminiChatSession {
    fn model(&self) -> &str {
        &self.model
    }

    async fn send_streaming(&self, parts: Vec<Part>) -> Result<TextStream> {
        let user = Content::new_user(parts);
        let request = self.build_request(&user);

        tracing::debug!(
            model = %self.model,
            turns = request.contents.len(),
            "Sending streaming request"
        );

        let response = self
            .auth
            .apply(self.client.post(&self.url).json(&request))
            .send()
            .await
            .map_err(|e| Error::transport(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read response".to_string());
            return Err(Error::transport(describe_http_error(status, &body)));
        }

        let history = self.history.clone();

        Ok(Box::new(Box::pin(stream! {
            let mut bytes_stream = response.bytes_stream();
            let mut pending: Vec<u8> = Vec::new();
            let mut buffer = String::new();
            let mut reply = String::new();
            let mut usage: Option<UsageMetadata> = None;

            while let Some(chunk) = bytes_stream.next().await {
                match chunk {
                    Ok(bytes) => {
                        pending.extend_from_slice(&bytes);
                        buffer.push_str(&take_utf8_prefix(&mut pending));

                        // Parse JSON objects from buffer
                        while let Some(json_str) = extract_json(&mut buffer) {
                            match serde_json::from_str::<GeminiResponse>(&json_str) {
                                Ok(gemini_resp) => {
                                    if let Some(error) = gemini_resp.error {
                                        yield Err(Error::transport(format!(
                                            "Gemini API error: {} (code: {})",
                                            error.message,
                                            error.code.unwrap_or(0)
                                        )));
                                        return;
                                    }

                                    let text = gemini_resp.text();
                                    if gemini_resp.usage_metadata.is_some() {
                                        usage = gemini_resp.usage_metadata;
                                    }
                                    if !text.is_empty() {
                                        reply.push_str(&text);
                                        yield Ok(text);
                                    }
                                }
                                Err(e) => {
                                    yield Err(Error::transport(format!("Failed to parse response: {}", e)));
                                    return;
                                }
                            }
                        }
                    }
                    Err(e) => {
                        yield Err(Error::transport(format!("Stream error: {}", e)));
                        return;
                    }
                }
            }

            if let Some(usage) = &usage {
                tracing::debug!(
                    prompt_tokens = ?usage.prompt_token_count,
                    reply_tokens = ?usage.candidates_token_count,
                    total_tokens = ?usage.total_token_count,
                    "Reply complete"
                );
            }

            let mut history = history.lock().unwrap_or_else(PoisonError::into_inner);
            history.push(user);
            history.push(Content::new_model_text(reply));
        })))
    }

    fn history(&self) -> Vec<Content> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

fn describe_http_error(status: reqwest::StatusCode, body: &str) -> String {
    let mut buffer = body.to_string();
    if let Some(json_str) = extract_json(&mut buffer)
        && let Ok(GeminiResponse {
            error: Some(error), ..
        }) = serde_json::from_str::<GeminiResponse>(&json_str)
    {
        return format!(
            "Gemini API error: {} (code: {})",
            error.message,
            error.code.unwrap_or(status.as_u16() as i32)
        );
    }
    format!("HTTP {}: {}", status, body.trim())
}

/// Drain the longest valid UTF-8 prefix from `pending`.
///
/// A multi-byte character split across network chunks stays in `pending`
/// until the rest of it arrives.
fn take_utf8_prefix(pending: &mut Vec<u8>) -> String {
    let checked = std::str::from_utf8(pending).map(str::len);
    let valid = match checked {
        Ok(len) => len,
        Err(e) if e.error_len().is_none() => e.valid_up_to(),
        Err(_) => {
            let text = String::from_utf8_lossy(pending).into_owned();
            pending.clear();
            return text;
        }
    };

    let rest = pending.split_off(valid);
    String::from_utf8(std::mem::replace(pending, rest)).unwrap_or_default()
}

/// Extract the next complete JSON object from a streamed JSON array
fn extract_json(buffer: &mut String) -> Option<String> {
    // Find the start of a JSON object
    let start = buffer.find('{')?;

    // Track brace depth to find the matching closing brace
    let mut depth = 0;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, c) in buffer[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match c {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    let end = start + i + 1;
                    let json_str = buffer[start..end].to_string();
                    buffer.drain(..end);
                    return Some(json_str);
                }
            }
            _ => {}
        }
    }

    None
}
