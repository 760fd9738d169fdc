//! Recommendation generation for the currently playing track.
//!
//! One request goes through at most one backend call. Whatever comes back is
//! rescored locally, and any failure lands on the static catalog.

use rand::Rng;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::catalog::derive_candidates;
use super::prompt::{build_messages, parse_tracks};
use crate::config::{DEFAULT_MAX_RESULTS, MAX_RESULTS_LIMIT};
use crate::llm::{CompletionOptions, LlmError, LlmProvider};
use crate::mixing::{rank, ReferenceContext, Track};
use crate::server::metrics::record_llm_request;

pub const SERVICE_UNAVAILABLE_ERROR: &str = "AI service temporarily unavailable";

#[derive(Debug, Clone)]
pub struct RecommendationRequest {
    pub reference: ReferenceContext,
    pub user_preferences: Option<String>,
    pub library_size: usize,
}

/// Where the returned tracks came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// Generated by the text-generation backend.
    Llm,
    /// Static catalog, used without any backend failure.
    Catalog,
    /// Static catalog after the backend failed or timed out.
    Fallback,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Llm => "llm",
            Source::Catalog => "catalog",
            Source::Fallback => "fallback",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Outcome {
    pub success: bool,
    pub fallback: bool,
    pub source: Source,
    pub error: Option<String>,
    /// Scored and ranked, best first.
    pub recommendations: Vec<Track>,
    pub analysis: ReferenceContext,
}

pub struct RecommendationGenerator {
    provider: Option<Arc<dyn LlmProvider>>,
    options: CompletionOptions,
    max_results: usize,
}

impl RecommendationGenerator {
    pub fn new(
        provider: Option<Arc<dyn LlmProvider>>,
        options: CompletionOptions,
        max_results: usize,
    ) -> Self {
        Self {
            provider,
            options,
            max_results: max_results.clamp(1, MAX_RESULTS_LIMIT),
        }
    }

    /// Generator that only ever uses the static catalog.
    pub fn catalog_only() -> Self {
        Self::new(None, CompletionOptions::default(), DEFAULT_MAX_RESULTS)
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    /// Produces at most `max_results` scored tracks for the request.
    ///
    /// Never fails: backend errors, timeouts and unusable replies all end up
    /// on the static catalog path, flagged in the returned [`Outcome`].
    pub async fn recommend<R: Rng>(&self, request: &RecommendationRequest, rng: &mut R) -> Outcome {
        let reference = &request.reference;

        let Some(provider) = &self.provider else {
            return self.from_catalog(reference, rng, Source::Catalog);
        };

        match self.generate(provider.as_ref(), request).await {
            Ok(reply) => match parse_tracks(&reply) {
                Ok(tracks) => {
                    let mut ranked = rank(tracks, reference);
                    ranked.truncate(self.max_results);
                    info!(
                        "Generated {} recommendations with {}",
                        ranked.len(),
                        provider.name()
                    );
                    Outcome {
                        success: true,
                        fallback: false,
                        source: Source::Llm,
                        error: None,
                        recommendations: ranked,
                        analysis: reference.clone(),
                    }
                }
                Err(err) => {
                    warn!("Unusable reply from {}: {}", provider.name(), err);
                    self.from_catalog(reference, rng, Source::Catalog)
                }
            },
            Err(err) => {
                warn!(
                    "Recommendation backend {} failed, falling back to catalog: {}",
                    provider.name(),
                    err
                );
                self.from_catalog(reference, rng, Source::Fallback)
            }
        }
    }

    async fn generate(
        &self,
        provider: &dyn LlmProvider,
        request: &RecommendationRequest,
    ) -> Result<String, LlmError> {
        let messages = build_messages(request, self.max_results);
        debug!(
            "Requesting recommendations from {} ({})",
            provider.name(),
            provider.model()
        );

        let start = Instant::now();
        let result =
            match tokio::time::timeout(self.options.timeout, provider.complete(&messages, &self.options))
                .await
            {
                Ok(result) => result,
                Err(_) => Err(LlmError::Timeout),
            };
        record_llm_request(
            provider.name(),
            if result.is_ok() { "ok" } else { "error" },
            start.elapsed(),
        );

        let response = result?;
        debug!(
            "Completion finished with {:?}, usage {:?}",
            response.finish_reason, response.usage
        );
        Ok(response.message.content)
    }

    fn from_catalog<R: Rng>(
        &self,
        reference: &ReferenceContext,
        rng: &mut R,
        source: Source,
    ) -> Outcome {
        let mut ranked = rank(derive_candidates(reference, rng), reference);
        ranked.truncate(self.max_results);

        let failed = source == Source::Fallback;
        Outcome {
            success: !failed,
            fallback: failed,
            source,
            error: failed.then(|| SERVICE_UNAVAILABLE_ERROR.to_string()),
            recommendations: ranked,
            analysis: reference.clone(),
        }
    }
}
