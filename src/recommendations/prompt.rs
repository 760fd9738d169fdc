//! Prompt formatting for the text-generation backend and parsing of its reply.

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use super::generator::RecommendationRequest;
use crate::llm::Message;
use crate::mixing::model::{DEFAULT_DANCEABILITY, DEFAULT_ENERGY};
use crate::mixing::{Key, Mood, Track};

pub const SYSTEM_PROMPT: &str = "You are an expert DJ and music producer with deep knowledge of \
music theory, BPM matching, key compatibility, and dance floor dynamics. Provide practical, \
actionable recommendations for DJ transitions.";

const NO_PREFERENCES: &str = "No specific preferences";

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("reply contains no JSON array")]
    NoJsonArray,

    #[error("malformed JSON array: {0}")]
    Json(#[from] serde_json::Error),

    #[error("reply contains no usable track")]
    Empty,
}

pub fn build_messages(request: &RecommendationRequest, max_results: usize) -> Vec<Message> {
    vec![
        Message::system(SYSTEM_PROMPT),
        Message::user(build_user_prompt(request, max_results)),
    ]
}

fn build_user_prompt(request: &RecommendationRequest, max_results: usize) -> String {
    let reference = &request.reference;
    let preferences = request
        .user_preferences
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .unwrap_or(NO_PREFERENCES);

    format!(
        r#"As an AI DJ assistant, analyze the current track and suggest compatible next tracks.

Current Track Analysis:
- BPM: {bpm}
- Key: {key}
- Mood: {mood}
- Energy: {energy}
- Danceability: {danceability}

User Preferences: {preferences}

Available Library: {library_size} tracks

Please suggest {max_results} compatible tracks that would work well as the next song in a DJ set.
Consider:
1. BPM compatibility (within ±20 BPM range)
2. Musical key compatibility
3. Mood and energy flow
4. Smooth transitions
5. Dance floor energy progression

Return the response as a JSON array with the following structure:
[
  {{
    "title": "Track Title",
    "artist": "Artist Name",
    "bpm": 130,
    "key": "D",
    "mood": "energetic",
    "energy": 0.8,
    "danceability": 0.7,
    "compatibility_score": 85,
    "transition_notes": "Brief notes about why this track works well as a transition"
  }}
]"#,
        bpm = reference.bpm,
        key = reference.key,
        mood = reference.mood,
        energy = reference.energy,
        danceability = reference.danceability,
        preferences = preferences,
        library_size = request.library_size,
        max_results = max_results,
    )
}

/// Track entry as produced by the model. Every field is optional so that one
/// sloppy entry does not sink the whole array.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GeneratedTrack {
    title: Option<String>,
    artist: Option<String>,
    bpm: Option<f64>,
    key: Option<String>,
    mood: Option<String>,
    energy: Option<f64>,
    danceability: Option<f64>,
    #[serde(alias = "transitionNotes")]
    transition_notes: Option<String>,
}

impl GeneratedTrack {
    fn into_track(self) -> Option<Track> {
        let title = self.title.filter(|t| !t.trim().is_empty())?;
        let artist = self.artist.filter(|a| !a.trim().is_empty())?;
        let bpm = self
            .bpm
            .filter(|b| b.is_finite() && *b >= 1.0)
            .map(|b| b.round() as u32)?;
        let key = self.key.filter(|k| !k.trim().is_empty()).map(Key::from)?;
        let mood = self.mood.filter(|m| !m.trim().is_empty()).map(Mood::from)?;

        let track = Track {
            title,
            artist,
            bpm,
            key,
            mood,
            energy: unit_or(self.energy, DEFAULT_ENERGY),
            danceability: unit_or(self.danceability, DEFAULT_DANCEABILITY),
            // Scores from the model are never trusted
            compatibility_score: None,
            transition_notes: self.transition_notes.filter(|n| !n.trim().is_empty()),
        };
        track.is_valid().then_some(track)
    }
}

fn unit_or(value: Option<f64>, default: f64) -> f64 {
    value
        .filter(|v| v.is_finite())
        .map(|v| v.clamp(0.0, 1.0))
        .unwrap_or(default)
}

/// Extracts the outermost JSON array from a reply, tolerating code fences
/// and surrounding prose.
fn extract_json_array(content: &str) -> Option<&str> {
    let start = content.find('[')?;
    let end = content.rfind(']')?;
    (end > start).then(|| &content[start..=end])
}

/// Parses the model's reply into unscored tracks, dropping unusable entries.
pub fn parse_tracks(content: &str) -> Result<Vec<Track>, ParseError> {
    let array = extract_json_array(content).ok_or(ParseError::NoJsonArray)?;
    let entries: Vec<serde_json::Value> = serde_json::from_str(array)?;
    let total = entries.len();

    let tracks: Vec<Track> = entries
        .into_iter()
        .filter_map(|entry| serde_json::from_value::<GeneratedTrack>(entry).ok())
        .filter_map(GeneratedTrack::into_track)
        .collect();

    if tracks.len() < total {
        debug!("Dropped {} unusable generated tracks", total - tracks.len());
    }
    if tracks.is_empty() {
        return Err(ParseError::Empty);
    }
    Ok(tracks)
}
