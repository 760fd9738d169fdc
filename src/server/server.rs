use anyhow::{Context, Result};
use std::future::IntoFuture;
use std::time::Duration;

use axum::{
    extract::State,
    middleware,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::services::ServeDir;
use tracing::info;

use super::metrics::metrics_handler;
#[cfg(feature = "slowdown")]
use super::slowdown_request;
use super::{
    log_requests, recommendation_routes::library_routes,
    recommendation_routes::recommendation_routes, session::AuthContext,
    spotify_routes::spotify_routes, state::ServerState, ServerConfig,
};
use crate::recommendations::RecommendationGenerator;
use crate::spotify::SpotifyAuth;

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub hash: String,
    pub llm_enabled: bool,
    pub spotify_enabled: bool,
}

#[derive(Serialize)]
struct SessionResponse {
    authenticated: bool,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
        llm_enabled: state.generator.has_provider(),
        spotify_enabled: state.spotify.is_some(),
    };
    Json(stats)
}

async fn get_session(auth: AuthContext) -> impl IntoResponse {
    Json(SessionResponse {
        authenticated: auth.is_authenticated(),
    })
}

pub fn make_app(
    config: ServerConfig,
    generator: RecommendationGenerator,
    spotify: Option<SpotifyAuth>,
) -> Router {
    let state = ServerState::new(config.clone(), generator, spotify);

    let api_routes: Router<ServerState> = Router::new()
        .nest("/ai", recommendation_routes())
        .nest("/library", library_routes())
        .nest("/spotify", spotify_routes())
        .route("/session", get(get_session))
        .route("/stats", get(home));

    let home_router: Router<ServerState> = match &config.frontend_dir_path {
        Some(frontend_path) => {
            let static_files_service =
                ServeDir::new(frontend_path).append_index_html_on_directories(true);
            Router::new().fallback_service(static_files_service)
        }
        None => Router::new().route("/", get(home)),
    };

    let mut app: Router = home_router
        .nest("/api", api_routes)
        .with_state(state.clone());

    #[cfg(feature = "slowdown")]
    {
        app = app.layer(middleware::from_fn(slowdown_request));
    }
    app = app.layer(middleware::from_fn_with_state(state, log_requests));

    app
}

fn make_metrics_app() -> Router {
    Router::new().route("/metrics", get(metrics_handler))
}

pub async fn run_server(
    config: ServerConfig,
    generator: RecommendationGenerator,
    spotify: Option<SpotifyAuth>,
) -> Result<()> {
    let port = config.port;
    let metrics_port = config.metrics_port;
    let app = make_app(config, generator, spotify);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;
    let metrics_listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", metrics_port))
        .await
        .with_context(|| format!("Failed to bind metrics port {}", metrics_port))?;

    info!("Ready to serve at port {}!", port);
    info!("Metrics available at port {}!", metrics_port);

    tokio::select! {
        result = axum::serve(listener, app).into_future() => {
            info!("HTTP server stopped: {:?}", result);
            result?;
        },
        result = axum::serve(metrics_listener, make_metrics_app()).into_future() => {
            info!("Metrics server stopped: {:?}", result);
            result?;
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        },
    }
    Ok(())
}
