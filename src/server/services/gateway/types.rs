use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Metadata describing a gateway's capabilities
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayMetadata {
    /// Name of the gateway provider
    pub name: String,
    /// Model every request is sent to
    pub model: String,
}

/// One structured generation call.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest {
    /// Prompt name, forwarded as the schema name where the provider wants one
    pub name: String,
    pub prompt: String,
    pub input_schema: Value,
    pub output_schema: Value,
}

impl GenerateRequest {
    /// Instruction text carrying both schemas, for providers that take the
    /// hints as a system message.
    pub fn schema_instructions(&self) -> String {
        format!(
            "The user message was rendered from input matching this JSON schema:\n{}\n\n\
             Respond with a single JSON object matching this JSON schema and nothing else:\n{}",
            self.input_schema, self.output_schema
        )
    }
}

/// Common message type used across gateways
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
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
