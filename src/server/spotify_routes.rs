//! Spotify OAuth HTTP routes.
//!
//! `GET /auth` hands the console an authorize URL, `GET /callback` receives
//! the provider redirect, swaps the code for tokens and sends the browser
//! back to the console.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::server::metrics::record_oauth_callback;
use crate::server::session::COOKIE_ACCESS_TOKEN_KEY;
use crate::server::state::{OptionalSpotifyAuth, ServerState};
use crate::spotify::{SpotifyAuthError, TokenGrant};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUrlResponse {
    pub auth_url: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

fn error_redirect(code: &str) -> Response {
    record_oauth_callback(code);
    Redirect::temporary(&format!("/?error={}", code)).into_response()
}

fn success_redirect(grant: &TokenGrant) -> String {
    let mut location = format!(
        "/?access_token={}",
        urlencoding::encode(&grant.access_token)
    );
    if let Some(refresh_token) = &grant.refresh_token {
        location.push_str(&format!(
            "&refresh_token={}",
            urlencoding::encode(refresh_token)
        ));
    }
    if let Some(expires_in) = grant.expires_in {
        location.push_str(&format!("&expires_in={}", expires_in));
    }
    location
}

async fn get_auth_url(State(spotify): State<OptionalSpotifyAuth>) -> Response {
    match spotify {
        Some(spotify) => {
            let auth_url = spotify.authorize_url().await;
            Json(AuthUrlResponse { auth_url }).into_response()
        }
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse {
                error: "Spotify integration is not configured".to_string(),
            }),
        )
            .into_response(),
    }
}

async fn get_callback(
    State(spotify): State<OptionalSpotifyAuth>,
    Query(query): Query<CallbackQuery>,
    jar: CookieJar,
) -> Response {
    if let Some(err) = query.error {
        warn!("Spotify authorization denied: {}", err);
        return error_redirect("spotify_auth_failed");
    }

    let Some(spotify) = spotify else {
        let err = SpotifyAuthError::NotConfigured;
        error!("OAuth callback rejected: {}", err);
        return error_redirect(err.redirect_code());
    };

    let Some(code) = query.code.filter(|c| !c.is_empty()) else {
        return error_redirect("no_code");
    };

    match query.state {
        Some(state) if spotify.take_state(&state).await => {}
        _ => {
            warn!("OAuth callback with unknown or expired state");
            return error_redirect("invalid_state");
        }
    }

    match spotify.exchange_code(&code).await {
        Ok(grant) => {
            info!("Spotify authorization completed");
            record_oauth_callback("success");

            let jar = jar.add(access_token_cookie(&grant));
            (jar, Redirect::temporary(&success_redirect(&grant))).into_response()
        }
        Err(err) => {
            error!("Spotify token exchange failed: {}", err);
            error_redirect(err.redirect_code())
        }
    }
}

/// Session cookie for a fresh grant, expiring with the token when the
/// provider says when that is.
fn access_token_cookie(grant: &TokenGrant) -> Cookie<'static> {
    let mut cookie = Cookie::build((COOKIE_ACCESS_TOKEN_KEY, grant.access_token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);
    if let Some(expires_in) = grant.expires_in {
        let seconds = i64::try_from(expires_in).unwrap_or(i64::MAX);
        cookie = cookie.max_age(time::Duration::seconds(seconds));
    }
    cookie.build()
}

pub fn spotify_routes() -> Router<ServerState> {
    Router::new()
        .route("/auth", get(get_auth_url))
        .route("/callback", get(get_callback))
}
