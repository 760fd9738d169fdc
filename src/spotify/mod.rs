//! Spotify OAuth handshake.
//!
//! This module handles the authorization code flow for the streaming
//! provider:
//! - Authorization URL generation with a server-side `state` value
//! - Token exchange (authorization code for access/refresh tokens)
//!
//! Tokens are handed back to the browser; nothing is persisted here.

use rand::distr::{Alphanumeric, SampleString};
use serde::Deserialize;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::SpotifySettings;

pub const DEFAULT_AUTHORIZE_URL: &str = "https://accounts.spotify.com/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:3000/api/spotify/callback";

pub const DEFAULT_SCOPES: &[&str] = &[
    "user-read-private",
    "user-read-email",
    "playlist-read-private",
    "playlist-read-collaborative",
    "user-library-read",
    "user-top-read",
    "user-read-recently-played",
    "user-read-currently-playing",
    "user-modify-playback-state",
    "user-read-playback-state",
];

/// Pending states older than this are rejected by the callback.
pub const STATE_TTL_SECS: i64 = 300;

const STATE_LENGTH: usize = 16;

#[derive(Debug, Error)]
pub enum SpotifyAuthError {
    #[error("Spotify client credentials are not configured")]
    NotConfigured,

    #[error("Token endpoint returned status {status}: {body}")]
    TokenEndpoint { status: u16, body: String },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid token response: {0}")]
    InvalidResponse(String),
}

impl SpotifyAuthError {
    /// Error code carried back to the frontend in the redirect query.
    pub fn redirect_code(&self) -> &'static str {
        match self {
            SpotifyAuthError::NotConfigured => "spotify_auth_failed",
            SpotifyAuthError::TokenEndpoint { .. } => "token_exchange_failed",
            SpotifyAuthError::Transport(_) | SpotifyAuthError::InvalidResponse(_) => {
                "callback_error"
            }
        }
    }
}

/// Tokens returned by a successful code exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// In-memory store of `state` values handed out by [`SpotifyAuth::authorize_url`].
pub struct PendingStateStore {
    // state -> creation timestamp (unix seconds)
    states: RwLock<HashMap<String, i64>>,
}

impl PendingStateStore {
    pub fn new() -> Self {
        Self {
            states: RwLock::new(HashMap::new()),
        }
    }

    pub async fn store(&self, state: String, created_at: i64) {
        let mut states = self.states.write().await;
        states.insert(state, created_at);
    }

    /// Removes the state, returning whether it existed and had not expired.
    pub async fn take(&self, state: &str) -> bool {
        let now = chrono::Utc::now().timestamp();
        let mut states = self.states.write().await;
        match states.remove(state) {
            Some(created_at) => now - created_at < STATE_TTL_SECS,
            None => false,
        }
    }

    pub async fn cleanup_expired(&self) {
        let now = chrono::Utc::now().timestamp();
        let mut states = self.states.write().await;
        states.retain(|_, created_at| now - *created_at < STATE_TTL_SECS);
    }

    pub async fn len(&self) -> usize {
        self.states.read().await.len()
    }
}

impl Default for PendingStateStore {
    fn default() -> Self {
        Self::new()
    }
}

pub struct SpotifyAuth {
    settings: SpotifySettings,
    client: reqwest::Client,
    pending_states: PendingStateStore,
}

impl SpotifyAuth {
    pub fn new(settings: SpotifySettings) -> Self {
        info!(
            "Spotify OAuth configured with redirect URI {}",
            settings.redirect_uri
        );
        Self {
            settings,
            client: reqwest::Client::new(),
            pending_states: PendingStateStore::new(),
        }
    }

    pub fn settings(&self) -> &SpotifySettings {
        &self.settings
    }

    /// Builds the provider authorize URL and remembers its `state`.
    pub async fn authorize_url(&self) -> String {
        self.pending_states.cleanup_expired().await;

        let state = Alphanumeric.sample_string(&mut rand::rng(), STATE_LENGTH);
        self.pending_states
            .store(state.clone(), chrono::Utc::now().timestamp())
            .await;

        let scopes = self.settings.scopes.join(" ");
        format!(
            "{}?client_id={}&response_type=code&redirect_uri={}&scope={}&state={}",
            self.settings.authorize_url,
            urlencoding::encode(&self.settings.client_id),
            urlencoding::encode(&self.settings.redirect_uri),
            urlencoding::encode(&scopes),
            state
        )
    }

    /// Consumes a `state` value, `true` if it was issued here and is still fresh.
    pub async fn take_state(&self, state: &str) -> bool {
        let valid = self.pending_states.take(state).await;
        if !valid {
            debug!("Rejected unknown or expired OAuth state");
        }
        valid
    }

    /// Exchanges an authorization code at the token endpoint.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenGrant, SpotifyAuthError> {
        let form = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.settings.redirect_uri.as_str()),
        ];

        let response = self
            .client
            .post(&self.settings.token_url)
            .basic_auth(&self.settings.client_id, Some(&self.settings.client_secret))
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Token exchange failed with status {}: {}", status, body);
            return Err(SpotifyAuthError::TokenEndpoint {
                status: status.as_u16(),
                body,
            });
        }

        let grant: TokenGrant = response
            .json()
            .await
            .map_err(|e| SpotifyAuthError::InvalidResponse(e.to_string()))?;
        if grant.access_token.is_empty() {
            return Err(SpotifyAuthError::InvalidResponse(
                "empty access_token".to_string(),
            ));
        }
        debug!("Token exchange succeeded, expires_in={:?}", grant.expires_in);
        Ok(grant)
    }
}
