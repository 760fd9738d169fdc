//! Compatibility scoring of a candidate track against a reference context.

use super::compat::{keys_compatible, moods_compatible};
use super::model::{ReferenceContext, Track};

/// BPM difference at which the tempo component of the score reaches zero.
pub const BPM_DECAY_WINDOW: u32 = 50;

/// Hard cutoff of the pass/fail filter. Independent from [`BPM_DECAY_WINDOW`].
pub const MAX_BPM_DELTA: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Compatibility {
    pub bpm_delta: u32,
    pub bpm_score: f64,
    pub key_match: bool,
    pub mood_match: bool,
    /// Integer in 0..=100.
    pub score: u8,
    pub passes: bool,
}

pub fn score(candidate: &Track, reference: &ReferenceContext) -> Compatibility {
    let bpm_delta = candidate.bpm.abs_diff(reference.bpm);
    let bpm_score = (1.0 - bpm_delta as f64 / BPM_DECAY_WINDOW as f64).max(0.0);
    let key_match = keys_compatible(&candidate.key, &reference.key);
    let mood_match = moods_compatible(&candidate.mood, &reference.mood);

    let key_score = if key_match { 1.0 } else { 0.0 };
    let mood_score = if mood_match { 1.0 } else { 0.0 };
    let raw = ((bpm_score + key_score + mood_score) / 3.0 * 100.0).round();

    Compatibility {
        bpm_delta,
        bpm_score,
        key_match,
        mood_match,
        score: raw.clamp(0.0, 100.0) as u8,
        passes: bpm_delta <= MAX_BPM_DELTA && (key_match || mood_match),
    }
}

/// Sets `compatibility_score` on every track, replacing whatever was there.
pub fn annotate(tracks: &mut [Track], reference: &ReferenceContext) {
    for track in tracks.iter_mut() {
        track.compatibility_score = Some(score(track, reference).score);
    }
}

/// Annotates and orders by descending score. Ties keep their pool order.
pub fn rank(mut tracks: Vec<Track>, reference: &ReferenceContext) -> Vec<Track> {
    annotate(&mut tracks, reference);
    tracks.sort_by(|a, b| b.compatibility_score.cmp(&a.compatibility_score));
    tracks
}

/// Keeps the tracks passing the filter, annotated, in pool order.
pub fn filter_compatible(tracks: Vec<Track>, reference: &ReferenceContext) -> Vec<Track> {
    tracks
        .into_iter()
        .filter_map(|mut track| {
            let compatibility = score(&track, reference);
            if compatibility.passes {
                track.compatibility_score = Some(compatibility.score);
                Some(track)
            } else {
                None
            }
        })
        .collect()
}
