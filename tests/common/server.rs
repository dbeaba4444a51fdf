//! Test server lifecycle management
//!
//! Each test gets an isolated server on a random port with its own
//! tempdir-backed database. Dropping the server triggers a graceful
//! shutdown.

use super::constants::*;
use super::fixtures::{seed, SeededData};
use mlms_server::{make_app, RequestsLoggingLevel, ServerConfig, SqliteLibraryStore, TokenIssuer};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

pub struct TestServer {
    /// Base URL for making requests (e.g. "http://127.0.0.1:12345")
    pub base_url: String,

    /// Direct store access for assertions that bypass the HTTP layer.
    pub store: Arc<SqliteLibraryStore>,

    /// Ids of the seeded users and catalog rows.
    pub seeded: SeededData,

    _temp_db_dir: TempDir,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    pub async fn spawn() -> Self {
        let temp_db_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let db_path = temp_db_dir.path().join("library.db");
        let store =
            Arc::new(SqliteLibraryStore::new(&db_path).expect("Failed to open library store"));
        let seeded = seed(&store);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let config = ServerConfig {
            port,
            requests_logging_level: RequestsLoggingLevel::None,
        };
        let token_issuer = TokenIssuer::new(TEST_JWT_SECRET, Duration::from_secs(3600));
        let app = make_app(
            config,
            store.clone(),
            store.clone(),
            store.clone(),
            token_issuer,
        );

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            store,
            seeded,
            _temp_db_dir: temp_db_dir,
            _shutdown_tx: Some(shutdown_tx),
        };
        server.wait_for_ready().await;
        server
    }

    /// Polls the home endpoint until the server answers.
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => return,
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
