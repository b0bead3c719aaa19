use axum::{
    extract::Request,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::configuration::{FlowMode, ProviderKind, Settings};
use crate::routes::{health_check, home};
use crate::server::{
    handlers::{api, pages, score},
    services::{
        actions::{Actions, FlowBackend},
        ollama::{OllamaConfig, OllamaService},
        openrouter::{OpenRouterConfig, OpenRouterService},
        prompt::PromptError,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub backend: FlowBackend,
    pub actions: Arc<Actions>,
}

impl AppState {
    pub fn new(backend: FlowBackend) -> Result<Self, PromptError> {
        Ok(Self {
            backend,
            actions: Arc::new(Actions::new()?),
        })
    }
}

/// Picks the gateway named by `model.provider`, or none at all in offline
/// mode.
pub fn build_backend(settings: &Settings) -> Result<FlowBackend, reqwest::Error> {
    if settings.flows.mode == FlowMode::Offline {
        return Ok(FlowBackend::Offline);
    }

    let model = &settings.model;
    let backend = match model.provider {
        ProviderKind::OpenRouter => {
            let defaults = OpenRouterConfig::default();
            let config = OpenRouterConfig {
                base_url: model.base_url.clone().unwrap_or(defaults.base_url),
                model: model.model.clone().unwrap_or(defaults.model),
                temperature: model.temperature,
                timeout: model.timeout(),
            };
            FlowBackend::Live(Arc::new(OpenRouterService::with_config(
                model.api_key.clone(),
                config,
            )?))
        }
        ProviderKind::Ollama => {
            let defaults = OllamaConfig::default();
            let config = OllamaConfig {
                base_url: model.base_url.clone().unwrap_or(defaults.base_url),
                model: model.model.clone().unwrap_or(defaults.model),
                temperature: model.temperature,
            };
            FlowBackend::Live(Arc::new(OllamaService::with_config(config, model.timeout())?))
        }
    };
    Ok(backend)
}

pub fn configure_app(settings: &Settings) -> anyhow::Result<Router> {
    let backend = build_backend(settings)?;
    info!("Flows running {}", backend.describe());
    let state = AppState::new(backend)?;
    Ok(app_router(state))
}

async fn log_request(request: Request, next: Next) -> Response {
    info!("{} {}", request.method(), request.uri().path());
    next.run(request).await
}

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/health", get(health_check))
        .route("/simulator", get(pages::simulator).post(pages::submit_simulator))
        .route(
            "/repurpose-bot",
            get(pages::repurpose_bot).post(pages::submit_repurpose_bot),
        )
        .route("/radar", get(pages::radar).post(pages::submit_radar))
        .route("/api/simulator", post(api::simulator))
        .route("/api/repurpose-bot", post(api::repurpose_bot))
        .route("/api/radar", post(api::radar))
        .route("/api/score", post(score::score))
        .layer(middleware::from_fn(log_request))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
