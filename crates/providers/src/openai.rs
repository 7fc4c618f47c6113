//! OpenAI-compatible provider implementation.
//!
//! Works with OpenAI and any endpoint exposing the same API surface.
//! Chat-style payloads go to `/chat/completions`; flat text payloads go to
//! the legacy `/completions` endpoint. Both return plain text.

use async_trait::async_trait;
use lorekeep_core::error::ProviderError;
use lorekeep_core::provider::{CompletionRequest, PromptPayload, Role, RoleMessage};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// An OpenAI-compatible LLM provider.
pub struct OpenAiProvider {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiProvider {
    /// Create a new OpenAI-compatible provider.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        }
    }

    /// Create an OpenAI provider (convenience constructor).
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self::new("openai", "https://api.openai.com/v1", api_key)
    }

    /// Convert role-tagged messages to the API wire format, prepending the
    /// system message when it is non-empty.
    fn to_api_messages(system: &str, messages: &[RoleMessage]) -> Vec<ApiMessage> {
        let mut out = Vec::with_capacity(messages.len() + 1);
        if !system.is_empty() {
            out.push(ApiMessage {
                role: "system".into(),
                content: system.to_string(),
            });
        }
        out.extend(messages.iter().map(|m| ApiMessage {
            role: match m.role {
                Role::System => "system".into(),
                Role::User => "user".into(),
                Role::Assistant => "assistant".into(),
            },
            content: m.content.clone(),
        }));
        out
    }

    /// Map an HTTP error status to a ProviderError, consuming the response.
    async fn error_for_status(
        status: u16,
        response: reqwest::Response,
    ) -> ProviderError {
        if status == 429 {
            return ProviderError::RateLimited {
                retry_after_secs: 5,
            };
        }
        if status == 401 || status == 403 {
            return ProviderError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            );
        }
        let error_body = response.text().await.unwrap_or_default();
        warn!(status, body = %error_body, "Provider returned error");
        ProviderError::ApiError {
            status_code: status,
            message: error_body,
        }
    }

    async fn complete_chat(
        &self,
        model: &str,
        system: &str,
        messages: &[RoleMessage],
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);

        let body = serde_json::json!({
            "model": model,
            "messages": Self::to_api_messages(system, messages),
            "temperature": temperature,
            "max_tokens": max_tokens,
        });

        debug!(provider = %self.name, model, "Sending chat completion request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if status != 200 {
            return Err(Self::error_for_status(status, response).await);
        }

        let api_response: ChatApiResponse =
            response.json().await.map_err(|e| ProviderError::ApiError {
                status_code: 200,
                message: format!("Failed to parse response: {e}"),
            })?;

        let choice =
            api_response
                .choices
                .into_iter()
                .next()
                .ok_or_else(|| ProviderError::ApiError {
                    status_code: 200,
                    message: "No choices in response".into(),
                })?;

        Ok(choice.message.content.trim().to_string())
    }

    async fn complete_text(
        &self,
        model: &str,
        prompt: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, ProviderError> {
        let url = format!("{}/completions", self.base_url);

        let body = serde_json::json!({
            "model": model,
            "prompt": prompt,
            "temperature": temperature,
            "max_tokens": max_tokens,
        });

        debug!(provider = %self.name, model, "Sending text completion request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if status != 200 {
            return Err(Self::error_for_status(status, response).await);
        }

        let api_response: TextApiResponse =
            response.json().await.map_err(|e| ProviderError::ApiError {
                status_code: 200,
                message: format!("Failed to parse response: {e}"),
            })?;

        let choice =
            api_response
                .choices
                .into_iter()
                .next()
                .ok_or_else(|| ProviderError::ApiError {
                    status_code: 200,
                    message: "No choices in response".into(),
                })?;

        Ok(choice.text.trim().to_string())
    }
}

#[async_trait]
impl lorekeep_core::Provider for OpenAiProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: CompletionRequest) -> Result<String, ProviderError> {
        match &request.payload {
            PromptPayload::Chat { system, messages } => {
                self.complete_chat(
                    &request.model,
                    system,
                    messages,
                    request.temperature,
                    request.max_tokens,
                )
                .await
            }
            PromptPayload::Text(prompt) => {
                self.complete_text(
                    &request.model,
                    prompt,
                    request.temperature,
                    request.max_tokens,
                )
                .await
            }
        }
    }
}

// --- OpenAI API types (internal) ---

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatApiResponse {
    choices: Vec<ChatApiChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatApiChoice {
    message: ApiMessage,
}

#[derive(Debug, Deserialize)]
struct TextApiResponse {
    choices: Vec<TextApiChoice>,
}

#[derive(Debug, Deserialize)]
struct TextApiChoice {
    text: String,
}
