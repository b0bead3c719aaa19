use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::server::services::gateway::types::Message;

#[derive(Debug, Serialize)]
pub struct OpenRouterRequest {
    pub model: String,
    pub messages: Vec<OpenRouterMessage>,
    pub stream: bool,
    pub temperature: f32,
    pub response_format: ResponseFormat,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OpenRouterMessage {
    pub role: String,
    pub content: String,
}

impl From<Message> for OpenRouterMessage {
    fn from(msg: Message) -> Self {
        OpenRouterMessage {
            role: msg.role,
            content: msg.content,
        }
    }
}

/// `response_format` asking for output that matches a JSON schema.
#[derive(Debug, Serialize)]
pub struct ResponseFormat {
    pub r#type: &'static str,
    pub json_schema: JsonSchemaFormat,
}

#[derive(Debug, Serialize)]
pub struct JsonSchemaFormat {
    pub name: String,
    pub schema: Value,
}

impl ResponseFormat {
    pub fn json_schema(name: &str, schema: Value) -> Self {
        Self {
            r#type: "json_schema",
            json_schema: JsonSchemaFormat {
                name: name.to_string(),
                schema,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct OpenRouterResponse {
    #[serde(default)]
    pub choices: Vec<OpenRouterChoice>,
}

#[derive(Debug, Deserialize)]
pub struct OpenRouterChoice {
    pub message: OpenRouterReply,
}

#[derive(Debug, Deserialize)]
pub struct OpenRouterReply {
    #[serde(default)]
    pub content: Option<String>,
}
