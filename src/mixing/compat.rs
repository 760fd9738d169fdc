//! Harmonic and mood compatibility tables.
//!
//! Both tables are one-directional as written (`F` lists `Bb`, but `Bb` has no
//! row of its own), so every compatibility check consults both rows.

use super::model::{Key, Mood};

pub const DEFAULT_KEYS: &[Key] = &[Key::C, Key::F, Key::G];
pub const DEFAULT_MOODS: &[Mood] = &[Mood::Energetic, Mood::Upbeat];

const KEYS_C: &[Key] = &[Key::C, Key::F, Key::G];
const KEYS_D: &[Key] = &[Key::D, Key::G, Key::A];
const KEYS_E: &[Key] = &[Key::E, Key::A, Key::B];
const KEYS_F: &[Key] = &[Key::F, Key::BFlat, Key::C];
const KEYS_G: &[Key] = &[Key::G, Key::C, Key::D];
const KEYS_A: &[Key] = &[Key::A, Key::D, Key::E];
const KEYS_B: &[Key] = &[Key::B, Key::E, Key::FSharp];

const MOODS_ENERGETIC: &[Mood] = &[Mood::Energetic, Mood::Upbeat];
const MOODS_UPBEAT: &[Mood] = &[Mood::Energetic, Mood::Upbeat, Mood::Happy];
const MOODS_MELANCHOLIC: &[Mood] = &[Mood::Melancholic, Mood::Dark, Mood::Emotional];
const MOODS_DARK: &[Mood] = &[Mood::Dark, Mood::Melancholic];
const MOODS_HAPPY: &[Mood] = &[Mood::Happy, Mood::Upbeat];

/// Keys listed as compatible with `key`, falling back to [`DEFAULT_KEYS`] for
/// keys without a row.
pub fn compatible_keys(key: &Key) -> &'static [Key] {
    match key {
        Key::C => KEYS_C,
        Key::D => KEYS_D,
        Key::E => KEYS_E,
        Key::F => KEYS_F,
        Key::G => KEYS_G,
        Key::A => KEYS_A,
        Key::B => KEYS_B,
        Key::BFlat | Key::FSharp | Key::Other(_) => DEFAULT_KEYS,
    }
}

/// Moods listed as compatible with `mood`, falling back to [`DEFAULT_MOODS`].
pub fn compatible_moods(mood: &Mood) -> &'static [Mood] {
    match mood {
        Mood::Energetic => MOODS_ENERGETIC,
        Mood::Upbeat => MOODS_UPBEAT,
        Mood::Melancholic => MOODS_MELANCHOLIC,
        Mood::Dark => MOODS_DARK,
        Mood::Happy => MOODS_HAPPY,
        Mood::Emotional | Mood::Other(_) => DEFAULT_MOODS,
    }
}

pub fn keys_compatible(a: &Key, b: &Key) -> bool {
    compatible_keys(a).contains(b) || compatible_keys(b).contains(a)
}

pub fn moods_compatible(a: &Mood, b: &Mood) -> bool {
    compatible_moods(a).contains(b) || compatible_moods(b).contains(a)
}
