//! DJ Console Server Library
//!
//! This library exposes the internal modules for testing and potential reuse.

pub mod config;
pub mod llm;
pub mod mixing;
pub mod recommendations;
pub mod server;
pub mod spotify;

// Re-export commonly used types for convenience
pub use mixing::{Key, Mood, ReferenceContext, Track};
pub use recommendations::RecommendationGenerator;
pub use server::{make_app, run_server, RequestsLoggingLevel, ServerConfig};
pub use spotify::SpotifyAuth;
