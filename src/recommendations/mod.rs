//! Next-track recommendations.
//!
//! The generator asks the configured text-generation backend for candidates
//! and always has the static catalog to fall back on. Whatever the source,
//! tracks are scored against the reference by [`crate::mixing`] before they
//! leave this module.

pub mod catalog;
pub mod generator;
pub mod prompt;

pub use generator::{
    Outcome, RecommendationGenerator, RecommendationRequest, Source, SERVICE_UNAVAILABLE_ERROR,
};
pub use prompt::ParseError;
