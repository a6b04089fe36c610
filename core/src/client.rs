use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use crate::config::{PartyConfig, DEFAULT_BASE_URL};
use crate::errors::{PartyError, PartyResult};
use crate::types::*;

/// Temperature used for in-character replies
pub const DEFAULT_TEMPERATURE: f32 = 0.8;

/// Temperature used for speaker-selection queries
pub const DECISION_TEMPERATURE: f32 = 0.3;

/// A single request/response call against a chat completion endpoint.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Sends `messages` to `model` and returns the completion text.
    async fn complete(
        &self,
        model: &str,
        messages: &[ChatMessage],
        temperature: f32,
        search_enabled: bool,
    ) -> PartyResult<String>;
}

/// Client for the xAI chat completions API
#[derive(Debug, Clone)]
pub struct GrokClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GrokClient {
    /// Create a new client from an API key and base URL
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> PartyResult<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(PartyError::config(
                "API key is required to initialize the completion client",
            ));
        }

        Ok(Self {
            client: Client::new(),
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Create a client from the loaded configuration
    pub fn from_config(config: &PartyConfig) -> PartyResult<Self> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            PartyError::config("API key is required to initialize the completion client")
        })?;
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self::new(api_key, base_url)
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    /// Pulls the first choice's text out of a completion response
    pub fn extract_text(response: ChatCompletionResponse) -> PartyResult<String> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| PartyError::ResponseError("No choices in response".to_string()))?;

        choice
            .message
            .content
            .ok_or_else(|| PartyError::ResponseError("No content in choice".to_string()))
    }
}

#[async_trait]
impl CompletionClient for GrokClient {
    async fn complete(
        &self,
        model: &str,
        messages: &[ChatMessage],
        temperature: f32,
        search_enabled: bool,
    ) -> PartyResult<String> {
        let request = ChatCompletionRequest {
            model,
            messages,
            temperature,
            stream: false,
            search_parameters: search_enabled.then(SearchParameters::default),
        };

        debug!(model, temperature, search_enabled, "Sending completion request");

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            warn!(model, status = status.as_u16(), "Completion request failed");
            return Err(PartyError::RequestError {
                status_code: status.as_u16(),
                body,
            });
        }

        let body = response.json::<ChatCompletionResponse>().await?;
        Self::extract_text(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_requires_api_key() {
        let err = GrokClient::new("  ", DEFAULT_BASE_URL).unwrap_err();
        assert!(matches!(err, PartyError::ConfigError(_)));
    }

    #[test]
    fn test_completions_url_trims_slash() {
        let client = GrokClient::new("key", "https://example.test/v1/").unwrap();
        assert_eq!(
            client.completions_url(),
            "https://example.test/v1/chat/completions"
        );
    }

    #[test]
    fn test_from_config_uses_default_base_url() {
        let config = PartyConfig {
            api_key: Some("key".to_string()),
            base_url: None,
            ..PartyConfig::default()
        };
        let client = GrokClient::from_config(&config).unwrap();
        assert_eq!(
            client.completions_url(),
            format!("{}/chat/completions", DEFAULT_BASE_URL)
        );
    }

    #[test]
    fn test_extract_text() {
        let response: ChatCompletionResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"Ahoy."}}]}"#,
        )
        .unwrap();
        assert_eq!(GrokClient::extract_text(response).unwrap(), "Ahoy.");
    }

    #[test]
    fn test_extract_text_without_choices() {
        let response: ChatCompletionResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        let err = GrokClient::extract_text(response).unwrap_err();
        assert!(matches!(err, PartyError::ResponseError(_)));
    }
}
