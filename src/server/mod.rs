pub mod config;
mod http_layers;
pub mod metrics;
mod recommendation_routes;
#[allow(clippy::module_inception)]
pub mod server;
pub mod session;
mod spotify_routes;
pub mod state;

pub use config::ServerConfig;
pub use http_layers::*;
pub use recommendation_routes::{
    CompatibleTracksBody, CompatibleTracksResponse, RecommendationBody, RecommendationResponse,
};
pub use server::{make_app, run_server};
pub use session::AuthContext;
