//! Structured prompt invocation: validated input in, rendered prompt out to
//! the model gateway, schema-checked structured result back.

pub mod competitor_filings;
pub mod molecule_what_if;
pub mod off_label_signals;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::marker::PhantomData;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::server::schema::{Reason, Shape, ValidationError, ValidationErrors};
use crate::server::services::gateway::{Gateway, GatewayError, GenerateRequest};
use crate::server::services::prompt::{PromptError, PromptTemplate};

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("invalid flow input: {0}")]
    InvalidInput(ValidationErrors),
    #[error(transparent)]
    Prompt(#[from] PromptError),
    #[error("model unavailable: {0}")]
    ModelUnavailable(#[from] GatewayError),
    #[error("malformed model response: {0}")]
    MalformedResponse(String),
}

/// One prompt template bound to an input shape and an output shape.
///
/// Every call is a fresh, single request: no cache, no retry, no repair of a
/// reply that fails to parse.
pub struct StructuredPrompt<I, O> {
    name: &'static str,
    input: Shape,
    output: Shape,
    template: PromptTemplate,
    _marker: PhantomData<fn(I) -> O>,
}

impl<I, O> StructuredPrompt<I, O>
where
    I: Serialize,
    O: DeserializeOwned,
{
    pub fn new(
        name: &'static str,
        input: Shape,
        output: Shape,
        template: &str,
    ) -> Result<Self, PromptError> {
        let template = PromptTemplate::compile(name, template, &input)?;
        Ok(Self {
            name,
            input,
            output,
            template,
            _marker: PhantomData,
        })
    }

    /// Validates `input` and renders the prompt text.
    pub fn render(&self, input: &I) -> Result<String, FlowError> {
        let value = serde_json::to_value(input).map_err(|e| {
            let mut errors = ValidationErrors::new();
            errors.push(ValidationError::new("$", Reason::WrongType, e.to_string()));
            FlowError::InvalidInput(errors)
        })?;
        let record = self.input.check(&value).map_err(FlowError::InvalidInput)?;
        Ok(self.template.render(&record)?)
    }

    /// Validates a model reply against the output shape. One parse attempt.
    pub fn parse_reply(&self, reply: &str) -> Result<O, FlowError> {
        let value: Value = serde_json::from_str(reply.trim())
            .map_err(|e| FlowError::MalformedResponse(format!("reply is not JSON: {e}")))?;
        self.output
            .parse_value(&value)
            .map_err(|errors| FlowError::MalformedResponse(errors.to_string()))
    }

    pub async fn invoke(&self, gateway: &dyn Gateway, input: &I) -> Result<O, FlowError> {
        let prompt = self.render(input)?;
        let metadata = gateway.metadata();
        info!(prompt = self.name, gateway = %metadata.name, model = %metadata.model, "invoking flow");
        debug!(prompt = self.name, "rendered prompt:\n{}", prompt);

        let request = GenerateRequest {
            name: self.name.to_string(),
            prompt,
            input_schema: self.input.json_schema(),
            output_schema: self.output.json_schema(),
        };

        let reply = gateway.generate(request).await.map_err(|e| {
            warn!(prompt = self.name, "gateway call failed: {}", e);
            FlowError::from(e)
        })?;

        self.parse_reply(&reply).map_err(|e| {
            warn!(prompt = self.name, "rejected model reply: {}", e);
            e
        })
    }
}
