//! Chat-completions client for structured bulletin extraction

use crate::app::models::{Bulletin, ExtractionDocument};
use crate::config::ExtractionConfig;
use crate::constants::EXTRACTION_SYSTEM_MESSAGE;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::debug;

use super::prompt::{build_prompt, parse_response};

/// Source of structured extractions for bulletin text
pub trait Extractor {
    /// Extract the object records and bulletin-level fields from one bulletin
    fn extract(&self, bulletin: &Bulletin) -> impl Future<Output = Result<ExtractionDocument>> + Send;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// OpenAI-compatible chat-completions extractor
#[derive(Debug, Clone)]
pub struct OpenAiExtractor {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl OpenAiExtractor {
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: api_key.into(),
        })
    }

    /// Build from configuration, reading the API key from the configured variable
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` if the API key variable is unset or empty.
    pub fn from_config(config: &ExtractionConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                Error::configuration(format!(
                    "API key not found: set the {} environment variable",
                    config.api_key_env
                ))
            })?;

        Self::new(
            &config.endpoint,
            &config.model,
            api_key,
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, bulletin: &Bulletin) -> Result<String> {
        let prompt = build_prompt(&bulletin.body);
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: EXTRACTION_SYSTEM_MESSAGE,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
        };

        debug!("Requesting extraction for {} from {}", bulletin.id, self.endpoint);
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::extraction(
                &bulletin.id,
                format!("endpoint returned {}: {}", status.as_u16(), body),
            ));
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| Error::extraction(&bulletin.id, "response has no message content"))
    }
}

impl Extractor for OpenAiExtractor {
    async fn extract(&self, bulletin: &Bulletin) -> Result<ExtractionDocument> {
        let content = self.complete(bulletin).await?;
        parse_response(&bulletin.id, &content)
    }
}

/// Extractor that answers every bulletin with a fixed model response
#[derive(Debug, Clone)]
pub struct FixedResponseExtractor {
    response: String,
}

impl FixedResponseExtractor {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
        }
    }
}

impl Extractor for FixedResponseExtractor {
    async fn extract(&self, bulletin: &Bulletin) -> Result<ExtractionDocument> {
        parse_response(&bulletin.id, &self.response)
    }
}
