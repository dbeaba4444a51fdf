//! Music library management server.
//!
//! This library exposes the internal modules for the e2e test suite.

pub mod config;
pub mod server;
pub mod sqlite_persistence;
pub mod store;
pub mod user;

pub use server::{make_app, run_server, RequestsLoggingLevel, ServerConfig};
pub use store::SqliteLibraryStore;
pub use user::{TokenIssuer, UserRole};
