//! Track compatibility scoring.
//!
//! - `model`: tracks, keys, moods and the reference context
//! - `compat`: key and mood compatibility tables
//! - `scorer`: BPM/key/mood scoring, ranking and the pass/fail filter

pub mod compat;
pub mod model;
pub mod scorer;

pub use compat::{compatible_keys, compatible_moods, keys_compatible, moods_compatible};
pub use model::{Key, Mood, PartialReference, ReferenceContext, Track};
pub use scorer::{filter_compatible, rank, score, Compatibility};
