//! Common test infrastructure
//!
//! Provides everything the end-to-end tests need: an isolated server on a
//! random port with a seeded database, and an HTTP client that carries the
//! bearer token. Tests should only import from this module.

mod client;
mod constants;
mod fixtures;
mod server;

pub use client::TestClient;
pub use constants::*;
#[allow(unused_imports)]
pub use fixtures::SeededData;
pub use server::TestServer;
