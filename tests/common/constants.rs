//! Shared constants for end-to-end tests
//!
//! This module contains all constants used across the test suite.
//! When fake credentials or fixture tracks change, update only this file.

// ============================================================================
// Fake Credentials
// ============================================================================

/// Spotify client id configured on the test server
pub const SPOTIFY_CLIENT_ID: &str = "test-client-id";

/// Spotify client secret configured on the test server
pub const SPOTIFY_CLIENT_SECRET: &str = "test-client-secret";

/// Authorization code the fake token endpoint accepts
pub const VALID_AUTH_CODE: &str = "valid-code";

/// Access token the fake token endpoint hands out
pub const FAKE_ACCESS_TOKEN: &str = "fake-access-token";

/// Refresh token the fake token endpoint hands out
pub const FAKE_REFRESH_TOKEN: &str = "fake-refresh-token";

/// Token lifetime reported by the fake token endpoint
pub const FAKE_EXPIRES_IN: u64 = 3600;

/// API key configured for the fake OpenAI-compatible backend
pub const FAKE_OPENAI_KEY: &str = "sk-test-key";

// ============================================================================
// Fixture Tracks (the console's demo library)
// ============================================================================

pub const MIDNIGHT_CITY: &str = "Midnight City";
pub const BLINDING_LIGHTS: &str = "Blinding Lights";
pub const LEVITATING: &str = "Levitating";
pub const AS_IT_WAS: &str = "As It Was";
pub const BAD_GUY: &str = "Bad Guy";

// ============================================================================
// Test Timeouts and Configuration
// ============================================================================

/// Maximum time to wait for server to become ready (milliseconds)
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Timeout for individual HTTP requests (seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Polling interval when waiting for server ready (milliseconds)
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;

/// Backend timeout used by servers spawned with a slow provider (milliseconds)
pub const LLM_TIMEOUT_MS: u64 = 200;

/// Seed for servers that need reproducible catalog picks
pub const TEST_RNG_SEED: u64 = 1234;
