//! Voice catalog entries and the ranked voice-selection criteria.

use serde::{Deserialize, Serialize};

use super::mode::VoiceGender;

/// Primary language subtag treated as "English-family".
const ENGLISH: &str = "en";

/// One voice offered by the speech engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceInfo {
    /// Engine-specific voice name (passed back to the engine verbatim).
    pub name: String,
    /// BCP-47-ish language tag, e.g. `en-US`, `en_GB`, `de`.
    pub language: String,
}

impl VoiceInfo {
    pub fn new(name: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            language: language.into(),
        }
    }

    /// `true` when the primary language subtag is `en`.
    pub fn is_english(&self) -> bool {
        self.language
            .split(['-', '_'])
            .next()
            .is_some_and(|primary| primary.eq_ignore_ascii_case(ENGLISH))
    }

    /// `true` when the voice name signals `gender`.
    ///
    /// Only a `female` marker is recognised; any voice without it counts as
    /// male-compatible.
    pub fn matches_gender(&self, gender: VoiceGender) -> bool {
        let female = self.name.to_lowercase().contains("female");
        match gender {
            VoiceGender::Female => female,
            VoiceGender::Male => !female,
        }
    }
}

/// Criteria used to pick a voice from the engine's catalog.
///
/// Applied in strict priority order by [`select`](Self::select):
///
/// 1. English voice whose name matches the requested gender.
/// 2. Any English voice.
/// 3. The first voice in the catalog.
///
/// An empty catalog selects nothing; the engine then uses its own default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoiceSelector {
    pub gender: VoiceGender,
}

impl VoiceSelector {
    pub fn new(gender: VoiceGender) -> Self {
        Self { gender }
    }

    pub fn select<'a>(&self, catalog: &'a [VoiceInfo]) -> Option<&'a VoiceInfo> {
        catalog
            .iter()
            .find(|v| v.is_english() && v.matches_gender(self.gender))
            .or_else(|| catalog.iter().find(|v| v.is_english()))
            .or_else(|| catalog.first())
    }
}
