pub mod configuration;
pub mod routes;
pub mod server;

pub use configuration::get_configuration;
pub use server::config::{app_router, configure_app};
