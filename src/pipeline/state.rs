//! Playback state and the shared handle the UI reads.
//!
//! [`PlaybackPhase`] is the sequencer's lifecycle.  The UI reads
//! [`PlaybackState`] via [`SharedState`] to render the avatar, the word strip
//! and the control buttons.
//!
//! Only the sequencer mutates the state.  Two invariants hold whenever the
//! lock is released:
//!
//! - `current_word` is `None` iff the phase is `Idle`, and otherwise indexes
//!   into `words` (or is `Some(0)` for an empty word list).
//! - `mouth_openness` is `0` unless the phase is `Speaking`.
//!
//! [`SharedState`] is a type alias for `Arc<Mutex<PlaybackState>>`; cheap to
//! clone and safe to share across threads.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::speech::Generation;

// ---------------------------------------------------------------------------
// PlaybackPhase
// ---------------------------------------------------------------------------

/// Lifecycle of one playback.
///
/// ```text
/// Idle ──start──▶ Speaking ──pause──▶ Paused
///                  ▲   │               │
///                  │   └──resume◀──────┘
///                  │
/// any phase ──stop / end / failure / 10 s ceiling──▶ Idle
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlaybackPhase {
    /// Nothing is playing.
    #[default]
    Idle,

    /// The engine is (or is about to be) speaking and the mouth is animating.
    Speaking,

    /// Speech is suspended; the mouth is closed.
    Paused,
}

impl PlaybackPhase {
    /// Returns `true` while a playback is in progress (speaking or paused).
    ///
    /// ```
    /// use talking_avatar::pipeline::PlaybackPhase;
    ///
    /// assert!(!PlaybackPhase::Idle.is_active());
    /// assert!(PlaybackPhase::Speaking.is_active());
    /// assert!(PlaybackPhase::Paused.is_active());
    /// ```
    pub fn is_active(self) -> bool {
        !matches!(self, PlaybackPhase::Idle)
    }

    /// A short label for the status line.
    pub fn label(self) -> &'static str {
        match self {
            PlaybackPhase::Idle => "Idle",
            PlaybackPhase::Speaking => "Speaking",
            PlaybackPhase::Paused => "Paused",
        }
    }
}

// ---------------------------------------------------------------------------
// PlaybackState
// ---------------------------------------------------------------------------

/// Everything the UI needs to draw the avatar.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaybackState {
    pub phase: PlaybackPhase,

    /// Jaw opening in `[0, 100]`.
    pub mouth_openness: f32,

    /// Highlighted word; `None` while idle.
    pub current_word: Option<usize>,

    /// Words of the text being spoken, captured when playback started.
    ///
    /// Edits to the text box during playback do not touch this.
    pub words: Vec<String>,

    /// Generation of the current (or last stopped) playback.
    pub generation: Generation,

    /// User-visible failure message, shown once by the UI.
    pub notice: Option<String>,
}

impl PlaybackState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The word currently highlighted, if any.
    pub fn current_word_text(&self) -> Option<&str> {
        self.current_word
            .and_then(|i| self.words.get(i))
            .map(String::as_str)
    }

    /// `true` when both playback invariants hold.
    pub fn is_consistent(&self) -> bool {
        let word_ok = match (self.phase, self.current_word) {
            (PlaybackPhase::Idle, None) => true,
            (PlaybackPhase::Idle, Some(_)) | (_, None) => false,
            (_, Some(i)) => i == 0 || i < self.words.len(),
        };
        let mouth_ok = self.phase == PlaybackPhase::Speaking || self.mouth_openness == 0.0;
        word_ok && mouth_ok
    }
}

// ---------------------------------------------------------------------------
// SharedState
// ---------------------------------------------------------------------------

/// Thread-safe handle to [`PlaybackState`].
///
/// Cheap to clone (`Arc` clone).  Lock through [`lock_state`] for a short
/// critical section; do **not** hold the lock across `.await` points.
pub type SharedState = Arc<Mutex<PlaybackState>>;

/// Construct a new [`SharedState`] in the idle phase.
pub fn new_shared_state() -> SharedState {
    Arc::new(Mutex::new(PlaybackState::new()))
}

/// Lock `state`, recovering the data if a previous holder panicked.
pub fn lock_state(state: &SharedState) -> MutexGuard<'_, PlaybackState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
