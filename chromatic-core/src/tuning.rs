//! # Musical Tuning Module
//!
//! This module maps frequencies to note names using twelve-tone equal
//! temperament referenced to A4 = 440 Hz.
//!
//! ## Features
//! - Frequency to nearest note name (pitch class + octave)
//! - Equal temperament target frequency for any note
//! - Cent deviation calculations for tuning accuracy
//! - Note name parsing ("A4", "C#3", "B-1")

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Concert pitch reference in Hz.
pub const A4_FREQUENCY: f32 = 440.0;

/// MIDI note number of A4.
pub const A4_MIDI: i32 = 69;

/// Octaves accepted when parsing note names. Far beyond audible range on both sides.
const OCTAVE_RANGE: std::ops::RangeInclusive<i32> = -100..=100;

/// One of the twelve pitch classes of the chromatic scale, in ascending order from C.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PitchClass {
    C,
    CSharp,
    D,
    DSharp,
    E,
    F,
    FSharp,
    G,
    GSharp,
    A,
    ASharp,
    B,
}

impl PitchClass {
    /// All pitch classes, indexed by semitones above C.
    pub const ALL: [PitchClass; 12] = [
        PitchClass::C,
        PitchClass::CSharp,
        PitchClass::D,
        PitchClass::DSharp,
        PitchClass::E,
        PitchClass::F,
        PitchClass::FSharp,
        PitchClass::G,
        PitchClass::GSharp,
        PitchClass::A,
        PitchClass::ASharp,
        PitchClass::B,
    ];

    const LABELS: [&str; 12] = [
        "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
    ];

    /// Semitones above C (0-11).
    pub fn index(self) -> usize {
        self as usize
    }

    /// The pitch class `semitones` above C, wrapping around the octave.
    pub fn from_semitones(semitones: i32) -> Self {
        Self::ALL[semitones.rem_euclid(12) as usize]
    }

    /// Sharp-spelled label, e.g. "C#".
    pub fn label(self) -> &'static str {
        Self::LABELS[self.index()]
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A note of the equal-tempered scale, e.g. A4 or C#-1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NoteName {
    pub pitch_class: PitchClass,
    /// Scientific pitch notation octave. Middle C is C4.
    pub octave: i32,
}

impl NoteName {
    pub fn new(pitch_class: PitchClass, octave: i32) -> Self {
        Self { pitch_class, octave }
    }

    /// The note with the given MIDI number. Negative numbers are allowed.
    pub fn from_midi(midi: i32) -> Self {
        Self {
            pitch_class: PitchClass::from_semitones(midi),
            octave: midi.div_euclid(12) - 1,
        }
    }

    /// MIDI note number, 69 for A4. Saturates for octaves near the `i32` limits.
    pub fn midi(self) -> i32 {
        self.octave
            .saturating_add(1)
            .saturating_mul(12)
            .saturating_add(self.pitch_class.index() as i32)
    }

    /// Equal temperament frequency of this note in Hz.
    pub fn frequency(self) -> f32 {
        A4_FREQUENCY * 2.0_f32.powf(self.midi().saturating_sub(A4_MIDI) as f32 / 12.0)
    }
}

impl fmt::Display for NoteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.pitch_class, self.octave)
    }
}

/// Error returned when a note name cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid note name: '{0}'")]
pub struct ParseNoteError(String);

impl FromStr for NoteName {
    type Err = ParseNoteError;

    /// Parses sharp-spelled names such as "A4", "C#3" or "B-1".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseNoteError(s.to_string());
        let split = s
            .find(|c: char| c == '-' || c.is_ascii_digit())
            .ok_or_else(err)?;
        let (label, octave) = s.split_at(split);
        let index = PitchClass::LABELS
            .iter()
            .position(|&l| l == label)
            .ok_or_else(err)?;
        let octave: i32 = octave.parse().map_err(|_| err())?;
        if !OCTAVE_RANGE.contains(&octave) {
            return Err(err());
        }
        Ok(NoteName::new(PitchClass::ALL[index], octave))
    }
}

/// Finds the note name nearest to a frequency.
///
/// The frequency is rounded to the nearest semitone on the MIDI scale
/// (`12 * log2(hz / 440)` rounded, plus 69) and split into a pitch class
/// and octave.
///
/// # Arguments
/// * `freq` - Frequency in Hz
///
/// # Returns
/// * `Some(note)` - Nearest equal-tempered note
/// * `None` - `freq` is zero, negative or not finite
pub fn note_name_for(freq: f32) -> Option<NoteName> {
    if !(freq.is_finite() && freq > 0.0) {
        return None;
    }
    let note_number = 12.0 * (freq / A4_FREQUENCY).log2();
    let midi = note_number.round() as i32 + A4_MIDI;
    Some(NoteName::from_midi(midi))
}

/// Finds the nearest note and its target frequency.
pub fn nearest_note(freq: f32) -> Option<(NoteName, f32)> {
    note_name_for(freq).map(|note| (note, note.frequency()))
}

/// Calculates the deviation from a target frequency in cents.
///
/// Cents are a logarithmic unit of pitch measurement where:
/// - 100 cents = 1 semitone
/// - 1200 cents = 1 octave
/// - Positive values indicate sharpness, negative values indicate flatness
pub fn cents_deviation(freq: f32, target_freq: f32) -> f32 {
    1200.0 * (freq / target_freq).log2()
}
