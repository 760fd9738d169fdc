//! Test server lifecycle management
//!
//! This module manages spawning and shutting down test HTTP servers.
//! Each test gets an isolated server with its own generator and OAuth state.

use super::constants::*;
use dj_console_server::config::SpotifySettings;
use dj_console_server::llm::{CompletionOptions, LlmProvider};
use dj_console_server::recommendations::RecommendationGenerator;
use dj_console_server::server::{make_app, RequestsLoggingLevel, ServerConfig};
use dj_console_server::spotify::SpotifyAuth;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

/// What the spawned server is wired to.
pub struct TestServerOptions {
    /// Text-generation backend, `None` serves the static catalog.
    pub provider: Option<Arc<dyn LlmProvider>>,
    pub spotify: Option<SpotifySettings>,
    pub rng_seed: Option<u64>,
    pub llm_timeout: Duration,
}

impl Default for TestServerOptions {
    fn default() -> Self {
        Self {
            provider: None,
            spotify: None,
            rng_seed: None,
            llm_timeout: Duration::from_millis(LLM_TIMEOUT_MS),
        }
    }
}

impl TestServerOptions {
    /// Spotify settings with test credentials pointing at `token_url`.
    pub fn spotify_settings(token_url: String) -> SpotifySettings {
        SpotifySettings {
            token_url,
            ..SpotifySettings::new(SPOTIFY_CLIENT_ID, SPOTIFY_CLIENT_SECRET)
        }
    }
}

/// Test server instance
///
/// When dropped, the server gracefully shuts down.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    pub port: u16,

    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a catalog-only server without Spotify credentials.
    pub async fn spawn() -> Self {
        Self::spawn_with(TestServerOptions::default()).await
    }

    /// Spawns a new test server on a random port
    ///
    /// # Panics
    ///
    /// Panics if port binding fails or the server doesn't become ready
    /// within timeout.
    pub async fn spawn_with(options: TestServerOptions) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");

        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();

        let base_url = format!("http://127.0.0.1:{}", port);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let config = ServerConfig {
            port,
            requests_logging_level: RequestsLoggingLevel::None,
            rng_seed: options.rng_seed,
            ..Default::default()
        };

        let generator = RecommendationGenerator::new(
            options.provider,
            CompletionOptions {
                timeout: options.llm_timeout,
                ..Default::default()
            },
            5,
        );

        let app = make_app(config, generator, options.spotify.map(SpotifyAuth::new));

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
            port,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// Waits for the server to become ready by polling the home endpoint
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
