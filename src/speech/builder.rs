//! Utterance builder: turns raw text plus delivery choices into the exact
//! configuration submitted to the speech engine.
//!
//! [`build_utterance`] is pure: the same text, mode, gender and voice catalog
//! always produce the same [`UtteranceConfig`].  It never fails; an
//! unrecognised mode (`None`) degrades to a neutral rate of `1.0` and the
//! gender's base pitch.

use super::mode::{Mode, VoiceGender};
use super::voice::{VoiceInfo, VoiceSelector};

/// Inputs longer than this many characters receive the mode preamble.
pub const PREAMBLE_MIN_CHARS: usize = 20;

/// Speaking rate used when no mode applies.
pub const NEUTRAL_RATE: f32 = 1.0;

/// Every utterance is spoken at full volume.
pub const FULL_VOLUME: f32 = 1.0;

// ---------------------------------------------------------------------------
// UtteranceConfig
// ---------------------------------------------------------------------------

/// Finalised speech request.
///
/// Built fresh for each playback and owned by the call that submits it; there
/// are no setters.
#[derive(Debug, Clone, PartialEq)]
pub struct UtteranceConfig {
    /// Text to speak, including any mode preamble.
    pub text: String,
    /// Rate multiplier (1.0 = engine default).
    pub rate: f32,
    /// Pitch multiplier (1.0 = engine default).
    pub pitch: f32,
    /// Volume in `[0.0, 1.0]`.
    pub volume: f32,
    /// Criteria the voice was chosen by.
    pub selector: VoiceSelector,
    /// Voice picked from the catalog; `None` leaves the engine default.
    pub voice: Option<VoiceInfo>,
}

// ---------------------------------------------------------------------------
// build_utterance
// ---------------------------------------------------------------------------

/// Build the [`UtteranceConfig`] for `text`.
///
/// ```
/// use talking_avatar::speech::{build_utterance, Mode, VoiceGender};
///
/// let u = build_utterance("Hello world", Some(Mode::News), VoiceGender::Male, &[]);
/// assert_eq!(u.text, "Hello world");
/// assert!((u.rate - 1.1).abs() < 1e-6);
/// assert!((u.pitch - 0.7).abs() < 1e-6);
/// assert!(u.voice.is_none());
/// ```
pub fn build_utterance(
    text: &str,
    mode: Option<Mode>,
    gender: VoiceGender,
    catalog: &[VoiceInfo],
) -> UtteranceConfig {
    let base_pitch = gender.base_pitch();

    let (text, rate, pitch) = match mode {
        Some(mode) => (
            with_preamble(text, mode),
            mode.rate(),
            base_pitch + mode.pitch_offset(),
        ),
        None => (text.to_string(), NEUTRAL_RATE, base_pitch),
    };

    let selector = VoiceSelector::new(gender);
    let voice = selector.select(catalog).cloned();

    UtteranceConfig {
        text,
        rate,
        pitch,
        volume: FULL_VOLUME,
        selector,
        voice,
    }
}

/// Prepend the mode preamble to texts longer than [`PREAMBLE_MIN_CHARS`].
///
/// Text that already opens with the preamble is returned unchanged.  The
/// comparison ignores the preamble's trailing space.
pub fn with_preamble(text: &str, mode: Mode) -> String {
    let preamble = mode.preamble();
    let long_enough = text.chars().count() > PREAMBLE_MIN_CHARS;
    let already_prefixed = text.starts_with(preamble.trim_end());

    if long_enough && !already_prefixed {
        format!("{preamble}{text}")
    } else {
        text.to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const PODCAST_TEXT: &str = "Today we talk about Rust"; // 24 chars

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn short_news_text_gets_no_preamble() {
        let u = build_utterance("Hello world", Some(Mode::News), VoiceGender::Male, &[]);
        assert_eq!(u.text, "Hello world");
        assert!(approx(u.rate, 1.1));
        assert!(approx(u.pitch, 0.7));
        assert!(approx(u.volume, 1.0));
    }

    #[test]
    fn long_podcast_text_gets_preamble() {
        let u = build_utterance(PODCAST_TEXT, Some(Mode::Podcast), VoiceGender::Female, &[]);
        assert!(u.text.starts_with("Hey folks! Welcome to the show. "));
        assert!(u.text.ends_with(PODCAST_TEXT));
        assert!(approx(u.rate, 0.95));
        assert!(approx(u.pitch, 1.35));
    }

    #[test]
    fn vlogging_pitch_and_rate() {
        let u = build_utterance(
            "Check out this amazing new gadget",
            Some(Mode::Vlogging),
            VoiceGender::Male,
            &[],
        );
        assert!(u.text.starts_with("What's up guys!"));
        assert!(approx(u.rate, 1.15));
        assert!(approx(u.pitch, 1.05));
    }

    #[test]
    fn exactly_twenty_chars_is_not_long_enough() {
        let text = "abcdefghijklmnopqrst";
        assert_eq!(text.chars().count(), 20);
        assert_eq!(with_preamble(text, Mode::News), text);
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        // 14 characters but more than 20 bytes.
        let text = "ข่าวด่วนวันนี้";
        assert!(text.len() > PREAMBLE_MIN_CHARS);
        assert_eq!(with_preamble(text, Mode::News), text);
    }

    #[test]
    fn preamble_is_not_duplicated() {
        for mode in Mode::ALL {
            let once = with_preamble("This sentence is clearly long enough", mode);
            let twice = with_preamble(&once, mode);
            assert_eq!(once, twice, "{mode}");
        }
    }

    #[test]
    fn preamble_without_trailing_space_counts_as_present() {
        let text = "Breaking news.The market rallied today";
        assert_eq!(with_preamble(text, Mode::News), text);
    }

    #[test]
    fn unknown_mode_uses_neutral_defaults() {
        let text = "A sufficiently long sentence for a preamble";
        let u = build_utterance(text, None, VoiceGender::Female, &[]);
        assert_eq!(u.text, text);
        assert!(approx(u.rate, NEUTRAL_RATE));
        assert!(approx(u.pitch, 1.2));
    }

    #[test]
    fn building_is_deterministic() {
        let catalog = vec![
            VoiceInfo::new("Samantha", "en-US"),
            VoiceInfo::new("Victoria Female", "en-US"),
        ];
        for mode in [None, Some(Mode::News), Some(Mode::Podcast), Some(Mode::Vlogging)] {
            for gender in VoiceGender::ALL {
                let a = build_utterance(PODCAST_TEXT, mode, gender, &catalog);
                let b = build_utterance(PODCAST_TEXT, mode, gender, &catalog);
                assert_eq!(a, b);
            }
        }
    }

    #[test]
    fn voice_is_resolved_from_catalog() {
        let catalog = vec![
            VoiceInfo::new("Samantha", "en-US"),
            VoiceInfo::new("Victoria Female", "en-US"),
        ];
        let u = build_utterance("Hi", Some(Mode::News), VoiceGender::Female, &catalog);
        assert_eq!(u.voice.unwrap().name, "Victoria Female");
        assert_eq!(u.selector.gender, VoiceGender::Female);
    }
}
