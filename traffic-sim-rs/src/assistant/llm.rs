// traffic-sim-rs/src/assistant/llm.rs
//
// HTTP client for an OpenAI-compatible chat completions endpoint
//
// Configuration comes from `BackendConfig`:
// - LLM_API_KEY: API key for the provider (required to build a client)
// - LLM_API_URL: chat completions URL (defaults to the OpenAI endpoint)
// - LLM_MODEL: model name (default "gpt-3.5-turbo")
//
// Requests are sent once. Failures are classified and returned to the caller.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::BackendConfig;
use crate::error::{Result, SimError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct Usage {
    total_tokens: u32,
}

/// Chat completions client
#[derive(Debug, Clone)]
pub struct LlmClient {
    client: Client,
    api_url: String,
    model: String,
    api_key: String,
}

impl LlmClient {
    pub fn new(
        api_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(SimError::configuration("LLM API key is empty"));
        }

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_url: api_url.into(),
            model: model.into(),
            api_key,
        })
    }

    /// Client described by the backend configuration, `None` without an API key
    pub fn from_config(config: &BackendConfig) -> Result<Option<Self>> {
        match &config.llm_api_key {
            Some(key) => Self::new(
                config.llm_api_url.clone(),
                config.llm_model.clone(),
                key.clone(),
                config.http_timeout,
            )
            .map(Some),
            None => Ok(None),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send the conversation and return the first choice's content
    pub async fn chat(&self, messages: &[ChatMessage]) -> Result<String> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages,
            temperature: 0.2,
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();

            return Err(match status.as_u16() {
                400 => SimError::validation(format!("Bad request: {}", text)),
                401 => SimError::validation(format!("Unauthorized: {}", text)),
                403 => SimError::validation(format!("Forbidden: {}", text)),
                404 => SimError::validation(format!("Not found: {}", text)),
                429 => SimError::service(format!("Rate limit exceeded: {}", text)),
                500 | 502 | 503 | 504 => {
                    SimError::service(format!("Server error ({}): {}", status, text))
                }
                _ => SimError::service(format!("Unexpected status ({}): {}", status, text)),
            });
        }

        let data: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| SimError::parsing(format!("Failed to parse response: {}", e)))?;

        if let Some(usage) = &data.usage {
            log::info!("LLM request completed. Used {} tokens", usage.total_tokens);
        }

        data.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| SimError::parsing("No choices returned in response"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_requires_api_key() {
        let result = LlmClient::new(
            "http://localhost/v1/chat/completions",
            "gpt-3.5-turbo",
            "",
            Duration::from_secs(1),
        );
        assert!(matches!(result, Err(SimError::Configuration(_))));
    }

    #[test]
    fn test_from_config_without_key() {
        let config = BackendConfig::default();
        assert!(LlmClient::from_config(&config).unwrap().is_none());
    }

    #[test]
    fn test_from_config_with_key() {
        let config = BackendConfig {
            llm_api_key: Some("sk-test".to_string()),
            llm_model: "local-model".to_string(),
            ..BackendConfig::default()
        };
        let client = LlmClient::from_config(&config).unwrap().unwrap();
        assert_eq!(client.model(), "local-model");
    }
}
