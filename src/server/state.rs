use axum::extract::FromRef;

use crate::recommendations::RecommendationGenerator;
use crate::spotify::SpotifyAuth;
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;

pub type GuardedGenerator = Arc<RecommendationGenerator>;
pub type OptionalSpotifyAuth = Option<Arc<SpotifyAuth>>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub generator: GuardedGenerator,
    pub spotify: OptionalSpotifyAuth,
    pub hash: String,
}

impl ServerState {
    pub fn new(
        config: ServerConfig,
        generator: RecommendationGenerator,
        spotify: Option<SpotifyAuth>,
    ) -> Self {
        ServerState {
            config,
            start_time: Instant::now(),
            generator: Arc::new(generator),
            spotify: spotify.map(Arc::new),
            hash: env!("GIT_HASH").to_string(),
        }
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}

impl FromRef<ServerState> for GuardedGenerator {
    fn from_ref(input: &ServerState) -> Self {
        input.generator.clone()
    }
}

impl FromRef<ServerState> for OptionalSpotifyAuth {
    fn from_ref(input: &ServerState) -> Self {
        input.spotify.clone()
    }
}
