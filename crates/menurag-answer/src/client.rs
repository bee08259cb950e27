//! OpenAI-compatible chat completions client.
//!
//! Works against any endpoint exposing `POST {base_url}/chat/completions`
//! with bearer auth (OpenAI, Azure proxies, local gateways).
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use menurag_core::config::GenerationSettings;
use menurag_core::error::{Error, Result};
use menurag_core::traits::TextGenerator;
use menurag_core::types::GenerationRequest;

use crate::parse::strip_code_fence;

#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::InvalidConfig(format!("http client: {e}")))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            model: "gpt-4o".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
        })
    }

    pub fn from_settings(settings: &GenerationSettings) -> Result<Self> {
        let api_key = settings
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Error::InvalidConfig("generation API key not set (OPENAI_API_KEY)".into()))?;
        Ok(Self::new(api_key, Duration::from_secs(settings.timeout_secs))?
            .with_model(&settings.model)
            .with_base_url(&settings.base_url))
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: &request.system },
                ChatMessage { role: "user", content: &request.user },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::ServiceCall(format!("chat completion timed out: {e}"))
                } else {
                    Error::ServiceCall(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(Error::ServiceCall(format!("chat completion returned {status}: {error_text}")));
        }

        let chat_response: ChatResponse =
            response.json().await.map_err(|e| Error::ServiceCall(format!("decode chat response: {e}")))?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::ServiceCall("no choices in chat response".into()))?;
        let content = strip_code_fence(&content);
        if content.is_empty() {
            return Err(Error::ServiceCall("empty chat response".into()));
        }
        tracing::debug!(model = %self.model, chars = content.len(), "chat completion");
        Ok(content.to_string())
    }
}
