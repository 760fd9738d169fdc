//! HTTP client for end-to-end tests
//!
//! This module provides a high-level HTTP client that wraps reqwest
//! and provides methods for all console endpoints.
//!
//! When API routes or request formats change, update only this file.

use super::constants::*;
use reqwest::redirect::Policy;
use reqwest::Response;
use serde_json::Value;
use std::time::Duration;

/// HTTP test client with a cookie store
///
/// Redirects are not followed so OAuth callback targets can be inspected.
pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .redirect(Policy::none())
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    // ========================================================================
    // Status
    // ========================================================================

    /// GET /
    pub async fn get_home(&self) -> Response {
        self.client
            .get(format!("{}/", self.base_url))
            .send()
            .await
            .expect("Home request failed")
    }

    // ========================================================================
    // Recommendations
    // ========================================================================

    /// POST /api/ai/recommendations
    pub async fn post_recommendations(&self, body: Value) -> Response {
        self.client
            .post(format!("{}/api/ai/recommendations", self.base_url))
            .json(&body)
            .send()
            .await
            .expect("Recommendations request failed")
    }

    /// POST /api/ai/recommendations with a raw, possibly malformed body
    pub async fn post_recommendations_raw(&self, body: &str) -> Response {
        self.client
            .post(format!("{}/api/ai/recommendations", self.base_url))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body.to_string())
            .send()
            .await
            .expect("Recommendations request failed")
    }

    /// POST /api/library/compatible
    pub async fn post_compatible(&self, body: Value) -> Response {
        self.client
            .post(format!("{}/api/library/compatible", self.base_url))
            .json(&body)
            .send()
            .await
            .expect("Compatible tracks request failed")
    }

    // ========================================================================
    // Spotify OAuth
    // ========================================================================

    /// GET /api/spotify/auth
    pub async fn get_spotify_auth(&self) -> Response {
        self.client
            .get(format!("{}/api/spotify/auth", self.base_url))
            .send()
            .await
            .expect("Spotify auth request failed")
    }

    /// GET /api/spotify/callback with the given query pairs
    pub async fn get_spotify_callback(&self, query: &[(&str, &str)]) -> Response {
        self.client
            .get(format!("{}/api/spotify/callback", self.base_url))
            .query(query)
            .send()
            .await
            .expect("Spotify callback request failed")
    }

    // ========================================================================
    // Session
    // ========================================================================

    /// GET /api/session
    pub async fn get_session(&self) -> Response {
        self.client
            .get(format!("{}/api/session", self.base_url))
            .send()
            .await
            .expect("Session request failed")
    }

    /// GET /api/session with an explicit bearer token
    pub async fn get_session_with_token(&self, token: &str) -> Response {
        self.client
            .get(format!("{}/api/session", self.base_url))
            .bearer_auth(token)
            .send()
            .await
            .expect("Session request failed")
    }
}
