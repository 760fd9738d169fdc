//! Built-in catalog used when no generated recommendations are available.

use rand::seq::IndexedRandom;
use rand::Rng;

use crate::mixing::{compatible_keys, compatible_moods, ReferenceContext, Track};

/// Largest bpm offset applied to a catalog entry, in either direction.
pub const BPM_JITTER: i64 = 5;

pub struct CatalogEntry {
    pub title: &'static str,
    pub artist: &'static str,
    pub energy: f64,
    pub danceability: f64,
    pub transition_notes: &'static str,
}

pub const CATALOG: &[CatalogEntry] = &[
    CatalogEntry {
        title: "Midnight City",
        artist: "M83",
        energy: 0.8,
        danceability: 0.7,
        transition_notes: "Smooth energy build with compatible key and BPM",
    },
    CatalogEntry {
        title: "Blinding Lights",
        artist: "The Weeknd",
        energy: 0.9,
        danceability: 0.8,
        transition_notes: "High energy track with perfect BPM match",
    },
    CatalogEntry {
        title: "Levitating",
        artist: "Dua Lipa",
        energy: 0.7,
        danceability: 0.9,
        transition_notes: "Great danceability with smooth mood transition",
    },
    CatalogEntry {
        title: "As It Was",
        artist: "Harry Styles",
        energy: 0.6,
        danceability: 0.6,
        transition_notes: "Lets the floor breathe without dropping the groove",
    },
    CatalogEntry {
        title: "Bad Guy",
        artist: "Billie Eilish",
        energy: 0.5,
        danceability: 0.7,
        transition_notes: "Minimal low end, easy to blend under a long mix",
    },
];

/// Derives one candidate per catalog entry, shaped after the reference.
///
/// Each candidate gets `reference.bpm` shifted by up to [`BPM_JITTER`]
/// (never below 1) plus a key and a mood drawn from the reference's
/// compatible sets. Candidates are returned unscored, in catalog order.
pub fn derive_candidates<R: Rng>(reference: &ReferenceContext, rng: &mut R) -> Vec<Track> {
    let keys = compatible_keys(&reference.key);
    let moods = compatible_moods(&reference.mood);

    CATALOG
        .iter()
        .map(|entry| {
            let offset = rng.random_range(-BPM_JITTER..=BPM_JITTER);
            let bpm = (reference.bpm as i64 + offset).clamp(1, u32::MAX as i64) as u32;
            // Both tables are non-empty, the fallbacks are never hit
            let key = keys.choose(rng).cloned().unwrap_or_else(|| reference.key.clone());
            let mood = moods
                .choose(rng)
                .cloned()
                .unwrap_or_else(|| reference.mood.clone());
            Track {
                title: entry.title.to_string(),
                artist: entry.artist.to_string(),
                bpm,
                key,
                mood,
                energy: entry.energy,
                danceability: entry.danceability,
                compatibility_score: None,
                transition_notes: Some(entry.transition_notes.to_string()),
            }
        })
        .collect()
}
