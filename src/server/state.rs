use axum::extract::FromRef;
use std::sync::Arc;
use std::time::Instant;

use crate::store::{AccountStore, CatalogStore, UserLibraryStore};
use crate::user::TokenIssuer;

use super::ServerConfig;

pub type GuardedCatalogStore = Arc<dyn CatalogStore>;
pub type GuardedAccountStore = Arc<dyn AccountStore>;
pub type GuardedLibraryStore = Arc<dyn UserLibraryStore>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub catalog: GuardedCatalogStore,
    pub accounts: GuardedAccountStore,
    pub library: GuardedLibraryStore,
    pub token_issuer: TokenIssuer,
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}

impl FromRef<ServerState> for GuardedCatalogStore {
    fn from_ref(input: &ServerState) -> Self {
        input.catalog.clone()
    }
}

impl FromRef<ServerState> for GuardedAccountStore {
    fn from_ref(input: &ServerState) -> Self {
        input.accounts.clone()
    }
}

impl FromRef<ServerState> for GuardedLibraryStore {
    fn from_ref(input: &ServerState) -> Self {
        input.library.clone()
    }
}

impl FromRef<ServerState> for TokenIssuer {
    fn from_ref(input: &ServerState) -> Self {
        input.token_issuer.clone()
    }
}
