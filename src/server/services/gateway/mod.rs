pub mod types;

use reqwest::StatusCode;
use thiserror::Error;

pub use self::types::{GatewayMetadata, GenerateRequest, Message};

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("request to {provider} failed: {source}")]
    Transport {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{provider} API error ({status}): {body}")]
    Api {
        provider: &'static str,
        status: StatusCode,
        body: String,
    },
    #[error("{provider} returned no content")]
    EmptyReply { provider: &'static str },
}

/// The boundary to a generative model: one prompt in, the raw text of one
/// reply out. Parsing the reply is the caller's job.
#[async_trait::async_trait]
pub trait Gateway: Send + Sync {
    fn metadata(&self) -> GatewayMetadata;

    async fn generate(&self, request: GenerateRequest) -> Result<String, GatewayError>;
}
