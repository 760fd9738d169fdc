use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use std::convert::Infallible;
use tracing::debug;

pub const COOKIE_ACCESS_TOKEN_KEY: &str = "spotify_access_token";

/// Whether the caller holds a streaming-provider access token.
///
/// Resolved from a single lookup: the `Authorization: Bearer` header first,
/// then the cookie set by the OAuth callback. The token is not validated
/// against the provider.
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    pub access_token: Option<String>,
}

impl AuthContext {
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    pub fn from_headers(headers: &HeaderMap) -> Self {
        let access_token = extract_token_from_authorization_header(headers)
            .or_else(|| extract_token_from_cookies(headers));
        if access_token.is_none() {
            debug!("No access token in headers nor cookies.");
        }
        AuthContext { access_token }
    }
}

fn extract_token_from_authorization_header(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))?
        .trim();
    (!token.is_empty()).then(|| token.to_string())
}

fn extract_token_from_cookies(headers: &HeaderMap) -> Option<String> {
    CookieJar::from_headers(headers)
        .get(COOKIE_ACCESS_TOKEN_KEY)
        .map(Cookie::value)
        .filter(|v| !v.is_empty())
        .map(|s| s.to_string())
}

impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(AuthContext::from_headers(&parts.headers))
    }
}
