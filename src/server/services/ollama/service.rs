use crate::server::services::gateway::{
    Gateway, GatewayError, GatewayMetadata, GenerateRequest, Message,
};
use crate::server::services::ollama::types::*;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

const PROVIDER: &str = "ollama";

pub struct OllamaService {
    config: OllamaConfig,
    client: Client,
}

impl OllamaService {
    pub fn with_config(config: OllamaConfig, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            config,
            client: Client::builder().timeout(timeout).build()?,
        })
    }

    fn to_messages(request: &GenerateRequest) -> Vec<ChatMessage> {
        [
            Message::system(request.schema_instructions()),
            Message::user(request.prompt.clone()),
        ]
        .into_iter()
        .map(|m| ChatMessage {
            role: m.role,
            content: m.content,
        })
        .collect()
    }
}

#[async_trait::async_trait]
impl Gateway for OllamaService {
    fn metadata(&self) -> GatewayMetadata {
        GatewayMetadata {
            name: "ollama".to_string(),
            model: self.config.model.clone(),
        }
    }

    async fn generate(&self, request: GenerateRequest) -> Result<String, GatewayError> {
        let url = format!("{}/api/chat", self.config.base_url.trim_end_matches('/'));
        debug!(prompt = %request.name, model = %self.config.model, "POST {}", url);

        let body = ChatRequest {
            model: self.config.model.clone(),
            messages: Self::to_messages(&request),
            stream: false,
            format: request.output_schema,
            options: ChatOptions {
                temperature: self.config.temperature,
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|source| GatewayError::Transport {
                provider: PROVIDER,
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let body = serde_json::from_str::<ErrorResponse>(&text)
                .map(|e| e.error)
                .unwrap_or(text);
            warn!("Ollama API error ({}): {}", status, body);
            return Err(GatewayError::Api {
                provider: PROVIDER,
                status,
                body,
            });
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|source| GatewayError::Transport {
                provider: PROVIDER,
                source,
            })?;

        if chat.message.content.trim().is_empty() {
            return Err(GatewayError::EmptyReply { provider: PROVIDER });
        }
        Ok(chat.message.content)
    }
}
