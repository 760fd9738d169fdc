//! Track data model shared by the scorer, the generator and the HTTP routes.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_BPM: u32 = 128;
pub const DEFAULT_ENERGY: f64 = 0.7;
pub const DEFAULT_DANCEABILITY: f64 = 0.6;
/// Highest bpm accepted from a client reference.
pub const MAX_BPM: u32 = 999;

/// Musical key label of a track.
///
/// Only the labels that appear in the compatibility table get their own
/// variant. Anything else is kept verbatim in [`Key::Other`] so that parsing a
/// label never fails.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Key {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
    BFlat,
    FSharp,
    Other(String),
}

impl Key {
    pub fn label(&self) -> &str {
        match self {
            Key::C => "C",
            Key::D => "D",
            Key::E => "E",
            Key::F => "F",
            Key::G => "G",
            Key::A => "A",
            Key::B => "B",
            Key::BFlat => "Bb",
            Key::FSharp => "F#",
            Key::Other(label) => label,
        }
    }
}

impl From<&str> for Key {
    fn from(label: &str) -> Self {
        match label.trim() {
            "C" => Key::C,
            "D" => Key::D,
            "E" => Key::E,
            "F" => Key::F,
            "G" => Key::G,
            "A" => Key::A,
            "B" => Key::B,
            "Bb" => Key::BFlat,
            "F#" => Key::FSharp,
            other => Key::Other(other.to_string()),
        }
    }
}

impl From<String> for Key {
    fn from(label: String) -> Self {
        Key::from(label.as_str())
    }
}

impl From<Key> for String {
    fn from(key: Key) -> Self {
        match key {
            Key::Other(label) => label,
            known => known.label().to_string(),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Coarse emotional label of a track. Matched case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Mood {
    Energetic,
    Upbeat,
    Melancholic,
    Dark,
    Happy,
    Emotional,
    Other(String),
}

impl Mood {
    pub fn label(&self) -> &str {
        match self {
            Mood::Energetic => "energetic",
            Mood::Upbeat => "upbeat",
            Mood::Melancholic => "melancholic",
            Mood::Dark => "dark",
            Mood::Happy => "happy",
            Mood::Emotional => "emotional",
            Mood::Other(label) => label,
        }
    }
}

impl From<&str> for Mood {
    fn from(label: &str) -> Self {
        let label = label.trim().to_lowercase();
        match label.as_str() {
            "energetic" => Mood::Energetic,
            "upbeat" => Mood::Upbeat,
            "melancholic" => Mood::Melancholic,
            "dark" => Mood::Dark,
            "happy" => Mood::Happy,
            "emotional" => Mood::Emotional,
            _ => Mood::Other(label),
        }
    }
}

impl From<String> for Mood {
    fn from(label: String) -> Self {
        Mood::from(label.as_str())
    }
}

impl From<Mood> for String {
    fn from(mood: Mood) -> Self {
        match mood {
            Mood::Other(label) => label,
            known => known.label().to_string(),
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One piece of music under consideration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub title: String,
    pub artist: String,
    pub bpm: u32,
    pub key: Key,
    pub mood: Mood,
    pub energy: f64,
    pub danceability: f64,
    /// Computed against a reference, never stored.
    #[serde(
        default,
        alias = "compatibility_score",
        skip_serializing_if = "Option::is_none"
    )]
    pub compatibility_score: Option<u8>,
    #[serde(
        default,
        alias = "transition_notes",
        skip_serializing_if = "Option::is_none"
    )]
    pub transition_notes: Option<String>,
}

impl Track {
    pub fn is_valid(&self) -> bool {
        !self.title.trim().is_empty()
            && !self.artist.trim().is_empty()
            && self.bpm > 0
            && is_unit(self.energy)
            && is_unit(self.danceability)
    }
}

fn is_unit(value: f64) -> bool {
    (0.0..=1.0).contains(&value)
}

/// Characteristics of the currently playing track, the baseline for scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceContext {
    pub bpm: u32,
    pub key: Key,
    pub mood: Mood,
    pub energy: f64,
    pub danceability: f64,
}

impl Default for ReferenceContext {
    fn default() -> Self {
        Self {
            bpm: DEFAULT_BPM,
            key: Key::C,
            mood: Mood::Energetic,
            energy: DEFAULT_ENERGY,
            danceability: DEFAULT_DANCEABILITY,
        }
    }
}

/// A reference context as sent by the client, every field optional.
///
/// Zero, negative and out-of-range values count as missing, as does a bpm
/// above [`MAX_BPM`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PartialReference {
    pub bpm: Option<f64>,
    pub key: Option<String>,
    pub mood: Option<String>,
    pub energy: Option<f64>,
    pub danceability: Option<f64>,
}

impl PartialReference {
    /// Picks the usable fields out of a loosely typed client object. A field
    /// of the wrong type counts as missing without affecting the others.
    pub fn from_value(value: &serde_json::Value) -> Self {
        let number = |name: &str| value.get(name).and_then(serde_json::Value::as_f64);
        let text = |name: &str| {
            value
                .get(name)
                .and_then(serde_json::Value::as_str)
                .map(str::to_string)
        };
        PartialReference {
            bpm: number("bpm"),
            key: text("key"),
            mood: text("mood"),
            energy: number("energy"),
            danceability: number("danceability"),
        }
    }

    pub fn resolve(self) -> ReferenceContext {
        let defaults = ReferenceContext::default();
        ReferenceContext {
            bpm: self
                .bpm
                .filter(|bpm| (1.0..=MAX_BPM as f64).contains(bpm))
                .map(|bpm| bpm.round() as u32)
                .unwrap_or(defaults.bpm),
            key: self
                .key
                .filter(|k| !k.trim().is_empty())
                .map(Key::from)
                .unwrap_or(defaults.key),
            mood: self
                .mood
                .filter(|m| !m.trim().is_empty())
                .map(Mood::from)
                .unwrap_or(defaults.mood),
            energy: self
                .energy
                .filter(|e| *e > 0.0 && *e <= 1.0)
                .unwrap_or(defaults.energy),
            danceability: self
                .danceability
                .filter(|d| *d > 0.0 && *d <= 1.0)
                .unwrap_or(defaults.danceability),
        }
    }
}
