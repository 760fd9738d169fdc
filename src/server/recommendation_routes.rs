//! Recommendation HTTP routes.
//!
//! Provides endpoints for:
//! - Next-track recommendations for the playing track
//! - Filtering a client library down to mixable tracks

use axum::{
    body::Bytes,
    extract::State,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::mixing::{filter_compatible, PartialReference, ReferenceContext, Track};
use crate::recommendations::{Outcome, RecommendationRequest};
use crate::server::metrics::record_recommendation;
use crate::server::state::ServerState;

// =============================================================================
// Request/Response Types
// =============================================================================

/// Fields stay loosely typed so that one bad field never costs the others.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RecommendationBody {
    pub current_track: Option<Value>,
    /// Free text, anything else is stringified.
    pub user_preferences: Option<Value>,
    pub library: Option<Value>,
    pub library_count: Option<Value>,
}

impl RecommendationBody {
    fn into_request(self) -> RecommendationRequest {
        let reference = self
            .current_track
            .as_ref()
            .map(PartialReference::from_value)
            .unwrap_or_default()
            .resolve();
        let user_preferences = match self.user_preferences {
            None | Some(Value::Null) => None,
            Some(Value::String(text)) => Some(text),
            Some(other) => Some(other.to_string()),
        };
        let library_size = match self.library {
            Some(Value::Array(tracks)) => Some(tracks.len()),
            _ => None,
        }
        .or_else(|| {
            self.library_count
                .as_ref()
                .and_then(Value::as_u64)
                .and_then(|count| usize::try_from(count).ok())
        })
        .unwrap_or(0);
        RecommendationRequest {
            reference,
            user_preferences,
            library_size,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    pub success: bool,
    pub recommendations: Vec<Track>,
    pub analysis: ReferenceContext,
    pub fallback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<Outcome> for RecommendationResponse {
    fn from(outcome: Outcome) -> Self {
        RecommendationResponse {
            success: outcome.success,
            recommendations: outcome.recommendations,
            analysis: outcome.analysis,
            fallback: outcome.fallback,
            error: outcome.error,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CompatibleTracksBody {
    pub reference: PartialReference,
    pub tracks: Vec<Track>,
}

#[derive(Debug, Serialize)]
pub struct CompatibleTracksResponse {
    pub tracks: Vec<Track>,
}

// =============================================================================
// Handlers
// =============================================================================

fn parse_recommendation_body(body: &[u8]) -> RecommendationBody {
    if body.iter().all(|b| b.is_ascii_whitespace()) {
        return RecommendationBody::default();
    }
    let fields = match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(fields)) => fields,
        Ok(_) => {
            warn!("Recommendation request is not a JSON object, using defaults");
            return RecommendationBody::default();
        }
        Err(err) => {
            warn!("Unreadable recommendation request, using defaults: {}", err);
            return RecommendationBody::default();
        }
    };
    serde_json::from_value(Value::Object(fields)).unwrap_or_else(|err| {
        warn!("Unreadable recommendation request, using defaults: {}", err);
        RecommendationBody::default()
    })
}

/// Always answers 200, failures are reported inside the body.
async fn post_recommendations(State(state): State<ServerState>, body: Bytes) -> impl IntoResponse {
    let request = parse_recommendation_body(&body).into_request();
    debug!("Recommendation request for {:?}", request.reference);

    let mut rng = match state.config.rng_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let outcome = state.generator.recommend(&request, &mut rng).await;

    info!(
        "Serving {} recommendations from {}",
        outcome.recommendations.len(),
        outcome.source.as_str()
    );
    record_recommendation(outcome.source.as_str());

    Json(RecommendationResponse::from(outcome))
}

async fn post_compatible_tracks(Json(body): Json<CompatibleTracksBody>) -> impl IntoResponse {
    let reference = body.reference.resolve();
    let total = body.tracks.len();
    let tracks = filter_compatible(body.tracks, &reference);
    debug!("{} of {} library tracks are compatible", tracks.len(), total);
    Json(CompatibleTracksResponse { tracks })
}

// =============================================================================
// Router
// =============================================================================

pub fn recommendation_routes() -> Router<ServerState> {
    Router::new().route("/recommendations", post(post_recommendations))
}

pub fn library_routes() -> Router<ServerState> {
    Router::new().route("/compatible", post(post_compatible_tracks))
}
