pub mod service;
pub mod types;

pub use service::OllamaService;
pub use types::OllamaConfig;
