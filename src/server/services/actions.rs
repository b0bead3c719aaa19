//! Form-facing adapters around the flows: validate a raw submission, run the
//! flow (or its offline fixture) and fold every outcome into an
//! [`ActionState`].

use futures::FutureExt;
use serde::{de::DeserializeOwned, Serialize};
use std::any::Any;
use std::marker::PhantomData;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{info, warn};

use super::flows::{
    competitor_filings::{self, CompetitorFilingAlert, CompetitorFilingInput},
    molecule_what_if::{self, MoleculeWhatIfInput, MoleculeWhatIfOutput},
    off_label_signals::{self, OffLabelSignalSet, OffLabelSignalsForm, OffLabelSignalsInput},
    StructuredPrompt,
};
use super::gateway::Gateway;
use super::prompt::PromptError;
use crate::server::schema::{RawFields, Shape, ValidationErrors};

pub const VALIDATION_FAILED: &str = "Validation failed";
pub const FLOW_FAILED: &str = "An unexpected error occurred";
pub const UNKNOWN_ERROR: &str = "Unknown error";

/// Where validated submissions go.
#[derive(Clone)]
pub enum FlowBackend {
    Live(Arc<dyn Gateway>),
    Offline,
}

impl FlowBackend {
    pub fn describe(&self) -> String {
        match self {
            FlowBackend::Live(gateway) => {
                let meta = gateway.metadata();
                format!("live ({} / {})", meta.name, meta.model)
            }
            FlowBackend::Offline => "offline".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionError {
    Validation { fields: ValidationErrors },
    Flow { message: String },
}

/// Outcome of one submission, as returned to the page or the JSON API.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionState<T> {
    pub message: String,
    pub data: Option<T>,
    pub error: Option<ActionError>,
}

impl<T> ActionState<T> {
    pub fn success(message: &str, data: T) -> Self {
        Self {
            message: message.to_string(),
            data: Some(data),
            error: None,
        }
    }

    pub fn invalid(fields: ValidationErrors) -> Self {
        Self {
            message: VALIDATION_FAILED.to_string(),
            data: None,
            error: Some(ActionError::Validation { fields }),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            message: FLOW_FAILED.to_string(),
            data: None,
            error: Some(ActionError::Flow {
                message: message.into(),
            }),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// First message per form field, empty unless validation failed.
    pub fn field_messages(&self) -> std::collections::BTreeMap<String, String> {
        match &self.error {
            Some(ActionError::Validation { fields }) => fields.messages(),
            _ => Default::default(),
        }
    }

    pub fn flow_message(&self) -> Option<&str> {
        match &self.error {
            Some(ActionError::Flow { message }) => Some(message),
            _ => None,
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        UNKNOWN_ERROR.to_string()
    }
}

/// One feature's adapter: form shape `F`, flow input `I`, flow output `O`.
pub struct Action<F, I, O> {
    name: &'static str,
    form: Shape,
    prompt: StructuredPrompt<I, O>,
    offline: fn(&I) -> O,
    success: &'static str,
    _form: PhantomData<fn() -> F>,
}

impl<F, I, O> Action<F, I, O>
where
    F: DeserializeOwned,
    I: From<F> + Serialize + Send + Sync,
    O: DeserializeOwned + Send,
{
    pub fn new(
        name: &'static str,
        form: Shape,
        prompt: StructuredPrompt<I, O>,
        offline: fn(&I) -> O,
        success: &'static str,
    ) -> Self {
        Self {
            name,
            form,
            prompt,
            offline,
            success,
            _form: PhantomData,
        }
    }

    pub async fn run(&self, backend: &FlowBackend, raw: &RawFields) -> ActionState<O> {
        let input: I = match self.form.parse_form::<F>(raw) {
            Ok(form) => form.into(),
            Err(fields) => {
                info!(action = self.name, errors = %fields, "validation failed");
                return ActionState::invalid(fields);
            }
        };

        let outcome = AssertUnwindSafe(self.execute(backend, &input))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(data)) => {
                info!(action = self.name, "completed");
                ActionState::success(self.success, data)
            }
            Ok(Err(message)) => {
                warn!(action = self.name, "flow failed: {}", message);
                ActionState::failed(message)
            }
            Err(payload) => {
                let message = panic_message(payload);
                warn!(action = self.name, "flow panicked: {}", message);
                ActionState::failed(message)
            }
        }
    }

    async fn execute(&self, backend: &FlowBackend, input: &I) -> Result<O, String> {
        match backend {
            FlowBackend::Live(gateway) => self
                .prompt
                .invoke(gateway.as_ref(), input)
                .await
                .map_err(|e| e.to_string()),
            FlowBackend::Offline => Ok((self.offline)(input)),
        }
    }
}

pub type SimulatorAction = Action<MoleculeWhatIfInput, MoleculeWhatIfInput, MoleculeWhatIfOutput>;
pub type RepurposeAction = Action<OffLabelSignalsForm, OffLabelSignalsInput, OffLabelSignalSet>;
pub type RadarAction = Action<CompetitorFilingInput, CompetitorFilingInput, CompetitorFilingAlert>;

/// The three adapters with their prompts compiled once.
pub struct Actions {
    pub simulator: SimulatorAction,
    pub repurpose: RepurposeAction,
    pub radar: RadarAction,
}

impl Actions {
    pub fn new() -> Result<Self, PromptError> {
        Ok(Self {
            simulator: Action::new(
                "simulator",
                molecule_what_if::form_shape(),
                molecule_what_if::prompt()?,
                molecule_what_if::offline,
                "Simulation complete",
            ),
            repurpose: Action::new(
                "repurpose-bot",
                off_label_signals::form_shape(),
                off_label_signals::prompt()?,
                off_label_signals::offline,
                "Analysis complete",
            ),
            radar: Action::new(
                "radar",
                competitor_filings::form_shape(),
                competitor_filings::prompt()?,
                competitor_filings::offline,
                "Alert set successfully",
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::schema::{FieldSpec, Reason};
    use crate::server::services::gateway::{GatewayError, GatewayMetadata, GenerateRequest};
    use serde::Deserialize;

    struct PanickingGateway;

    #[async_trait::async_trait]
    impl Gateway for PanickingGateway {
        fn metadata(&self) -> GatewayMetadata {
            GatewayMetadata {
                name: "panicking".into(),
                model: "none".into(),
            }
        }

        async fn generate(&self, _request: GenerateRequest) -> Result<String, GatewayError> {
            panic!("gateway exploded");
        }
    }

    struct DownGateway;

    #[async_trait::async_trait]
    impl Gateway for DownGateway {
        fn metadata(&self) -> GatewayMetadata {
            GatewayMetadata {
                name: "down".into(),
                model: "none".into(),
            }
        }

        async fn generate(&self, _request: GenerateRequest) -> Result<String, GatewayError> {
            Err(GatewayError::EmptyReply { provider: "down" })
        }
    }

    fn simulator_form() -> RawFields {
        RawFields::new()
            .with("molecule", "Sildenafil")
            .with("disease", "Alzheimer's Disease")
    }

    #[tokio::test]
    async fn short_field_fails_validation_without_data() {
        let actions = Actions::new().unwrap();
        let raw = RawFields::new().with("moleculeName", "M");
        let state = actions.repurpose.run(&FlowBackend::Offline, &raw).await;

        assert_eq!(state.message, VALIDATION_FAILED);
        assert!(state.data.is_none());
        let Some(ActionError::Validation { fields }) = &state.error else {
            panic!("expected a validation error, got {:?}", state.error);
        };
        assert_eq!(fields.reason_for("moleculeName"), Some(Reason::TooShort));
        assert_eq!(
            state.field_messages().get("moleculeName").map(String::as_str),
            Some("Molecule name is required.")
        );
    }

    #[tokio::test]
    async fn offline_run_returns_fixture() {
        let actions = Actions::new().unwrap();
        let state = actions.simulator.run(&FlowBackend::Offline, &simulator_form()).await;
        assert!(state.is_success());
        assert_eq!(state.message, "Simulation complete");
        assert_eq!(state.data.unwrap().sections().len(), 4);
    }

    #[tokio::test]
    async fn gateway_failure_becomes_flow_error() {
        let actions = Actions::new().unwrap();
        let backend = FlowBackend::Live(Arc::new(DownGateway));
        let state = actions.simulator.run(&backend, &simulator_form()).await;
        assert_eq!(state.message, FLOW_FAILED);
        assert!(state.data.is_none());
        assert!(state.flow_message().unwrap().contains("model unavailable"));
    }

    #[tokio::test]
    async fn panic_is_caught_at_the_boundary() {
        let actions = Actions::new().unwrap();
        let backend = FlowBackend::Live(Arc::new(PanickingGateway));
        let state = actions.simulator.run(&backend, &simulator_form()).await;
        assert_eq!(state.flow_message(), Some("gateway exploded"));
    }

    #[tokio::test]
    async fn panic_without_message_reports_unknown_error() {
        #[derive(Serialize, Deserialize)]
        struct Word {
            word: String,
        }

        fn explode(_: &Word) -> Word {
            std::panic::panic_any(42_u32)
        }

        let shape = Shape::new().field(FieldSpec::string("word"));
        let prompt = StructuredPrompt::new("word", shape.clone(), shape.clone(), "{{word}}").unwrap();
        let action: Action<Word, Word, Word> = Action::new("word", shape, prompt, explode, "ok");

        let state = action
            .run(&FlowBackend::Offline, &RawFields::new().with("word", "hi"))
            .await;
        assert_eq!(state.flow_message(), Some(UNKNOWN_ERROR));
    }

    #[test]
    fn action_state_serializes_tagged_errors() {
        let state: ActionState<()> = ActionState::failed("boom");
        let value = serde_json::to_value(&state).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "message": FLOW_FAILED,
                "data": null,
                "error": {"kind": "flow", "message": "boom"}
            })
        );
    }
}
