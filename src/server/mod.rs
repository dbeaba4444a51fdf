pub mod config;
mod error;
mod http_layers;
pub mod server;
mod session;
pub mod state;

mod admin_routes;
mod auth_routes;
mod catalog_routes;
mod user_routes;

pub use config::ServerConfig;
pub use error::{ApiError, ApiResult};
pub use http_layers::{log_requests, RequestsLoggingLevel};
#[allow(unused_imports)] // Used by main.rs
pub use server::{make_app, run_server};
