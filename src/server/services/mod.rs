pub mod actions;
pub mod flows;
pub mod gateway;
pub mod ollama;
pub mod openrouter;
pub mod prompt;
pub mod scoring;

pub use actions::{ActionState, Actions, FlowBackend};
pub use gateway::Gateway;
pub use ollama::OllamaService;
pub use openrouter::OpenRouterService;
