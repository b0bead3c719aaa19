mod service;
pub mod types;

pub use service::OpenRouterConfig;
pub use service::OpenRouterService;
