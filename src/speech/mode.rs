//! Delivery modes and voice genders.
//!
//! A [`Mode`] bundles the fixed per-style constants the utterance builder
//! applies: speaking rate, pitch offset and the spoken preamble.  A
//! [`VoiceGender`] selects the base pitch and the voice-catalog preference.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Parse errors
// ---------------------------------------------------------------------------

/// Returned when a mode key is not one of `news`, `podcast`, `vlogging`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown speech mode: {0:?}")]
pub struct UnknownMode(pub String);

/// Returned when a voice key is not `male` or `female`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown voice: {0:?}")]
pub struct UnknownVoice(pub String);

// ---------------------------------------------------------------------------
// Mode
// ---------------------------------------------------------------------------

/// Presentation style of the spoken text.
///
/// | Variant  | Rate | Pitch offset | Preamble                              |
/// |----------|------|--------------|---------------------------------------|
/// | News     | 1.1  | −0.10        | `Breaking news. `                     |
/// | Podcast  | 0.95 | +0.15        | `Hey folks! Welcome to the show. `    |
/// | Vlogging | 1.15 | +0.25        | `What's up guys! Don't forget …`      |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Professional, formal tone.
    News,
    /// Conversational, relaxed style.
    Podcast,
    /// Energetic, expressive delivery.
    Vlogging,
}

impl Mode {
    /// Every mode, in the order the UI lists them.
    pub const ALL: [Mode; 3] = [Mode::News, Mode::Podcast, Mode::Vlogging];

    /// Key used on the wire and in `settings.toml`.
    pub fn key(self) -> &'static str {
        match self {
            Mode::News => "news",
            Mode::Podcast => "podcast",
            Mode::Vlogging => "vlogging",
        }
    }

    /// Short button label.
    pub fn label(self) -> &'static str {
        match self {
            Mode::News => "News",
            Mode::Podcast => "Podcast",
            Mode::Vlogging => "Vlog",
        }
    }

    /// One-line description shown under the mode buttons.
    pub fn description(self) -> &'static str {
        match self {
            Mode::News => "Professional, formal tone",
            Mode::Podcast => "Conversational, relaxed style",
            Mode::Vlogging => "Energetic, expressive delivery",
        }
    }

    /// Speaking rate multiplier passed to the engine.
    pub fn rate(self) -> f32 {
        match self {
            Mode::News => 1.1,
            Mode::Podcast => 0.95,
            Mode::Vlogging => 1.15,
        }
    }

    /// Offset added to the voice's base pitch.
    pub fn pitch_offset(self) -> f32 {
        match self {
            Mode::News => -0.1,
            Mode::Podcast => 0.15,
            Mode::Vlogging => 0.25,
        }
    }

    /// Text spoken before longer inputs, including its trailing space.
    pub fn preamble(self) -> &'static str {
        match self {
            Mode::News => "Breaking news. ",
            Mode::Podcast => "Hey folks! Welcome to the show. ",
            Mode::Vlogging => "What's up guys! Don't forget to like and subscribe! ",
        }
    }
}

impl Default for Mode {
    fn default() -> Self {
        Mode::News
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Mode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "news" => Ok(Mode::News),
            "podcast" => Ok(Mode::Podcast),
            "vlogging" => Ok(Mode::Vlogging),
            _ => Err(UnknownMode(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// VoiceGender
// ---------------------------------------------------------------------------

/// Requested voice gender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceGender {
    Male,
    Female,
}

impl VoiceGender {
    pub const ALL: [VoiceGender; 2] = [VoiceGender::Male, VoiceGender::Female];

    pub fn key(self) -> &'static str {
        match self {
            VoiceGender::Male => "male",
            VoiceGender::Female => "female",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            VoiceGender::Male => "Male",
            VoiceGender::Female => "Female",
        }
    }

    /// Pitch before any mode offset is applied.
    pub fn base_pitch(self) -> f32 {
        match self {
            VoiceGender::Male => 0.8,
            VoiceGender::Female => 1.2,
        }
    }
}

impl Default for VoiceGender {
    fn default() -> Self {
        VoiceGender::Male
    }
}

impl fmt::Display for VoiceGender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for VoiceGender {
    type Err = UnknownVoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" => Ok(VoiceGender::Male),
            "female" => Ok(VoiceGender::Female),
            _ => Err(UnknownVoice(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
