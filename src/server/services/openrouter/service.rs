use crate::server::services::gateway::types::{GatewayMetadata, GenerateRequest, Message};
use crate::server::services::gateway::{Gateway, GatewayError};
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use std::time::Duration;
use tracing::{debug, warn};

use super::types::{OpenRouterRequest, OpenRouterResponse, ResponseFormat};

const PROVIDER: &str = "openrouter";

#[derive(Debug, Clone)]
pub struct OpenRouterConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub timeout: Duration,
}

impl Default for OpenRouterConfig {
    fn default() -> Self {
        Self {
            base_url: "https://openrouter.ai/api/v1".to_string(),
            model: "google/gemini-2.0-flash-001".to_string(),
            temperature: 0.2,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Any OpenAI-compatible chat completions endpoint (OpenRouter, OpenAI,
/// DeepSeek, a local proxy), asked for schema-constrained JSON.
#[derive(Clone)]
pub struct OpenRouterService {
    client: Client,
    api_key: Secret<String>,
    config: OpenRouterConfig,
}

impl OpenRouterService {
    pub fn with_config(
        api_key: Secret<String>,
        config: OpenRouterConfig,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            api_key,
            config,
        })
    }

    fn prepare_messages(&self, request: &GenerateRequest) -> Vec<Message> {
        vec![
            Message::system(request.schema_instructions()),
            Message::user(request.prompt.clone()),
        ]
    }
}

#[async_trait::async_trait]
impl Gateway for OpenRouterService {
    fn metadata(&self) -> GatewayMetadata {
        GatewayMetadata {
            name: "OpenRouter".to_string(),
            model: self.config.model.clone(),
        }
    }

    async fn generate(&self, request: GenerateRequest) -> Result<String, GatewayError> {
        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        debug!(prompt = %request.name, model = %self.config.model, "POST {}", url);

        let body = OpenRouterRequest {
            model: self.config.model.clone(),
            messages: self
                .prepare_messages(&request)
                .into_iter()
                .map(Into::into)
                .collect(),
            stream: false,
            temperature: self.config.temperature,
            response_format: ResponseFormat::json_schema(&request.name, request.output_schema),
        };

        let mut builder = self
            .client
            .post(&url)
            .header("X-Title", "TheraNova")
            .json(&body);
        if !self.api_key.expose_secret().is_empty() {
            builder = builder.bearer_auth(self.api_key.expose_secret());
        }

        let response = builder
            .send()
            .await
            .map_err(|source| GatewayError::Transport {
                provider: PROVIDER,
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("OpenRouter API error ({}): {}", status, body);
            return Err(GatewayError::Api {
                provider: PROVIDER,
                status,
                body,
            });
        }

        let parsed: OpenRouterResponse =
            response.json().await.map_err(|source| GatewayError::Transport {
                provider: PROVIDER,
                source,
            })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(GatewayError::EmptyReply { provider: PROVIDER })
    }
}
