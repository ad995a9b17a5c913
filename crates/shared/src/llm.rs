use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::PipelineError;

/// One request to the model service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRequest {
    pub model: String,
    pub prompt: String,
    pub max_tokens: u32,
}

/// The single network boundary used by both pipelines.
///
/// One attempt per call, no retries. Every failure comes back as
/// [`PipelineError::Transport`].
#[async_trait]
pub trait ModelInvoker: Send + Sync {
    async fn complete(&self, api_key: &str, request: &ModelRequest) -> Result<String, PipelineError>;
}

#[derive(Serialize)]
struct ClaudeRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ClaudeResponse {
    content: Vec<Content>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    text: Option<String>,
}

/// Anthropic Messages API client.
pub struct ClaudeClient {
    client: Client,
    endpoint: String,
}

impl ClaudeClient {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            endpoint: format!("{}/v1/messages", base_url.trim_end_matches('/')),
        })
    }

    async fn send(&self, api_key: &str, request: &ModelRequest) -> Result<String> {
        let body = ClaudeRequest {
            model: &request.model,
            max_tokens: request.max_tokens,
            messages: vec![Message {
                role: "user",
                content: &request.prompt,
            }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .context("Failed to send request to Claude API")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("unknown error"));
            anyhow::bail!("Claude API error ({}): {}", status, error_text);
        }

        let claude_response = response
            .json::<ClaudeResponse>()
            .await
            .context("Failed to parse Claude API response")?;

        claude_response
            .content
            .into_iter()
            .find_map(|c| c.text)
            .context("Claude API response contained no text")
    }
}

#[async_trait]
impl ModelInvoker for ClaudeClient {
    async fn complete(&self, api_key: &str, request: &ModelRequest) -> Result<String, PipelineError> {
        tracing::info!(
            model = %request.model,
            max_tokens = request.max_tokens,
            prompt_chars = request.prompt.len(),
            "Calling Claude API"
        );

        match self.send(api_key, request).await {
            Ok(text) => {
                tracing::debug!(response_chars = text.len(), "Claude API responded");
                Ok(text)
            }
            Err(e) => {
                tracing::warn!(error = %format!("{:#}", e), "Claude API call failed");
                Err(PipelineError::Transport(format!("{:#}", e)))
            }
        }
    }
}
