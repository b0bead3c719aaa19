pub mod config;
pub mod handlers;
pub mod schema;
pub mod services;

pub use config::AppState;
