#![allow(dead_code)]

use axum::Router;
use axum_test::TestServer;
use secrecy::Secret;
use std::sync::Arc;
use theranova::server::{
    config::{app_router, AppState},
    services::{
        actions::FlowBackend,
        ollama::{OllamaConfig, OllamaService},
        openrouter::{OpenRouterConfig, OpenRouterService},
        Gateway,
    },
};
use tracing::Level;

// Helper function to initialize logging once
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_test_writer()
        .try_init();
}

pub fn app(backend: FlowBackend) -> Router {
    app_router(AppState::new(backend).expect("prompts compile"))
}

pub fn offline_server() -> TestServer {
    init_logging();
    TestServer::new(app(FlowBackend::Offline)).expect("test server starts")
}

pub fn live_server(gateway: Arc<dyn Gateway>) -> TestServer {
    init_logging();
    TestServer::new(app(FlowBackend::Live(gateway))).expect("test server starts")
}

pub fn openrouter(base_url: &str) -> Arc<dyn Gateway> {
    let config = OpenRouterConfig {
        base_url: base_url.to_string(),
        model: "test/model".to_string(),
        ..Default::default()
    };
    Arc::new(
        OpenRouterService::with_config(Secret::new("test-key".to_string()), config)
            .expect("client builds"),
    )
}

pub fn ollama(base_url: &str) -> Arc<dyn Gateway> {
    let config = OllamaConfig {
        base_url: base_url.to_string(),
        model: "llama3.1".to_string(),
        temperature: 0.0,
    };
    Arc::new(
        OllamaService::with_config(config, std::time::Duration::from_secs(5))
            .expect("client builds"),
    )
}

/// An OpenAI-style completion whose message content is `content`.
pub fn completion(content: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "gen-test",
        "choices": [{
            "message": {
                "role": "assistant",
                "content": content
            },
            "finish_reason": "stop"
        }]
    })
}
