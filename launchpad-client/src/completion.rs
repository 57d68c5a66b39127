//! Chat-completion client

use crate::error::{ClientError, Result};
use crate::handle_response;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Sampling options sent with every completion request
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct CompletionOptions {
    temperature: f32,
    max_tokens: u32,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 2048,
        }
    }
}

/// HTTP client for an OpenAI-compatible chat-completions endpoint
#[derive(Clone)]
pub struct CompletionClient {
    /// Base URL including the version segment (e.g., "https://api.openai.com/v1")
    base_url: String,
    api_key: String,
    model: String,
    options: CompletionOptions,
    client: Client,
}

impl std::fmt::Debug for CompletionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("options", &self.options)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}

impl CompletionClient {
    /// Create a new completion client
    ///
    /// # Arguments
    /// * `base_url` - Endpoint base (e.g., "https://api.openai.com/v1")
    /// * `api_key` - Bearer credential
    /// * `model` - Model name (e.g., "gpt-4o")
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_client(base_url, api_key, model, Client::new())
    }

    /// Create a new completion client with a custom HTTP client
    pub fn with_client(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        client: Client,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            options: CompletionOptions::default(),
            client,
        }
    }

    /// Request one completion
    ///
    /// # Arguments
    /// * `system` - Fixed system instruction
    /// * `prompt` - Caller's free-text request
    ///
    /// # Returns
    /// The text of the first choice. No structure is assumed.
    pub async fn complete(&self, system: &str, prompt: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        tracing::debug!(model = %self.model, %url, "requesting completion");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&ChatRequest {
                model: &self.model,
                messages: [
                    ChatMessage {
                        role: "system",
                        content: system,
                    },
                    ChatMessage {
                        role: "user",
                        content: prompt,
                    },
                ],
                temperature: self.options.temperature,
                max_tokens: self.options.max_tokens,
            })
            .send()
            .await?;

        let reply: ChatResponse = handle_response(response).await?;

        reply
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ClientError::InvalidResponse("completion returned no content".to_string()))
    }
}
