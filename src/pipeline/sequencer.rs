//! Playback/animation sequencer.
//!
//! [`Sequencer`] owns the [`SharedState`], the [`SpeechSession`] and the
//! playback clock.  It is a plain state machine stepped by its caller: every
//! method takes the current `Instant`, so tests drive it deterministically and
//! the [`runner`](super::runner) drives it from a tokio interval.
//!
//! # Lifecycle
//!
//! ```text
//! start(req, now)
//!   ├─ blank text            → Rejected         (no change)
//!   ├─ Speaking / Paused     → stop(), Stopped  (double-purpose button)
//!   └─ Idle                  → cancel engine, generation += 1,
//!                              snapshot words, Speaking, clock.start,
//!                              queue utterance due at now + settle delay
//!
//! tick(now)      submit queued utterance once due, sample animation,
//!                stop when the 10 s ceiling is reached
//! handle_event   drop stale generations, stop on Ended / Failed
//! ```
//!
//! Every playback is tagged with a [`Generation`].  `stop()` also advances the
//! generation, so any callback still in flight from a stopped or superseded
//! utterance is recognised as stale and ignored.

use std::time::{Duration, Instant};

use crate::animation::{sample, split_words, AnimationFrame, PlaybackClock};
use crate::config::SpeechConfig;
use crate::speech::{
    build_utterance, EngineEvent, EngineEventKind, Generation, Mode, UtteranceConfig, VoiceGender,
};

use super::session::SpeechSession;
use super::state::{lock_state, PlaybackPhase, PlaybackState, SharedState};

/// Notice shown when synthesis fails for any reason other than our own
/// cancellation.
pub const FAILURE_NOTICE: &str = "Speech synthesis failed. Try again or use a different voice.";

// ---------------------------------------------------------------------------
// Requests and outcomes
// ---------------------------------------------------------------------------

/// What the user asked to hear.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechRequest {
    pub text: String,
    /// `None` for an unrecognised mode; the builder then uses neutral values.
    pub mode: Option<Mode>,
    pub voice: VoiceGender,
}

impl SpeechRequest {
    pub fn new(text: impl Into<String>, mode: Option<Mode>, voice: VoiceGender) -> Self {
        Self {
            text: text.into(),
            mode,
            voice,
        }
    }
}

/// Result of [`Sequencer::start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// Empty or whitespace-only text; nothing changed.
    Rejected,
    /// A playback was already active, so the request acted as a stop.
    Stopped,
    /// A new playback began with this generation.
    Started(Generation),
}

/// How [`Sequencer::handle_event`] treated an engine event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventDisposition {
    /// The event belongs to an older generation and was ignored.
    Stale,
    /// `Started`, `Paused` or `Resumed`; no state change.
    Informational,
    /// The engine finished speaking; playback stopped.
    Finished,
    /// Our own cancellation surfaced as an error; playback stopped silently.
    Interrupted,
    /// Synthesis failed; playback stopped and a notice was raised.
    Failed,
}

/// Utterance waiting out the settle delay.
#[derive(Debug)]
struct PendingUtterance {
    generation: Generation,
    due: Instant,
    utterance: UtteranceConfig,
}

// ---------------------------------------------------------------------------
// Sequencer
// ---------------------------------------------------------------------------

/// Drives one avatar's speech playback and mouth animation.
#[derive(Debug)]
pub struct Sequencer {
    state: SharedState,
    session: SpeechSession,
    clock: PlaybackClock,
    pending: Option<PendingUtterance>,
    generation: Generation,
    settle_delay: Duration,
    total: Duration,
}

impl Sequencer {
    pub fn new(state: SharedState, session: SpeechSession, config: &SpeechConfig) -> Self {
        let generation = lock_state(&state).generation;
        Self {
            state,
            session,
            clock: PlaybackClock::new(),
            pending: None,
            generation,
            settle_delay: config.settle_delay(),
            total: config.max_animation(),
        }
    }

    /// Handle to the state this sequencer publishes.
    pub fn state(&self) -> SharedState {
        SharedState::clone(&self.state)
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> PlaybackState {
        lock_state(&self.state).clone()
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    fn phase(&self) -> PlaybackPhase {
        lock_state(&self.state).phase
    }

    // -----------------------------------------------------------------------
    // Controls
    // -----------------------------------------------------------------------

    /// Begin speaking `request`, or stop if a playback is already active.
    pub fn start(&mut self, request: SpeechRequest, now: Instant) -> StartOutcome {
        let text = request.text.trim();
        if text.is_empty() {
            log::debug!("sequencer: ignoring empty text");
            return StartOutcome::Rejected;
        }

        if self.phase().is_active() {
            log::debug!("sequencer: start while active, treating as stop");
            self.stop();
            return StartOutcome::Stopped;
        }

        self.session.cancel();

        let generation = self.generation.next();
        self.generation = generation;

        let words = split_words(text);
        let utterance = build_utterance(text, request.mode, request.voice, &self.session.voices());

        {
            let mut st = lock_state(&self.state);
            st.phase = PlaybackPhase::Speaking;
            st.mouth_openness = 0.0;
            st.current_word = Some(0);
            st.words = words;
            st.generation = generation;
            st.notice = None;
        }

        self.clock.start(now);
        self.pending = Some(PendingUtterance {
            generation,
            due: now + self.settle_delay,
            utterance,
        });

        log::info!(
            "sequencer: {generation} speaking {} chars ({}, {})",
            text.chars().count(),
            request.mode.map_or("neutral", Mode::key),
            request.voice
        );
        StartOutcome::Started(generation)
    }

    /// Suspend speaking.  Returns `false` (and does nothing) unless speaking.
    pub fn pause(&mut self, now: Instant) -> bool {
        if self.phase() != PlaybackPhase::Speaking {
            return false;
        }

        if let Err(e) = self.session.pause() {
            log::warn!("sequencer: engine pause failed: {e}");
        }
        self.clock.pause(now);

        let mut st = lock_state(&self.state);
        st.phase = PlaybackPhase::Paused;
        st.mouth_openness = 0.0;
        log::debug!("sequencer: {} paused", self.generation);
        true
    }

    /// Continue a paused playback.  Returns `false` (and does nothing) unless
    /// paused.
    pub fn resume(&mut self, now: Instant) -> bool {
        if self.phase() != PlaybackPhase::Paused {
            return false;
        }

        if let Err(e) = self.session.resume() {
            log::warn!("sequencer: engine resume failed: {e}");
        }
        self.clock.resume(now);

        lock_state(&self.state).phase = PlaybackPhase::Speaking;
        log::debug!("sequencer: {} resumed", self.generation);
        true
    }

    /// Cancel the engine and reset to idle.  Always succeeds.
    pub fn stop(&mut self) {
        self.session.cancel();
        self.pending = None;
        self.clock.reset();
        self.generation = self.generation.next();

        let mut st = lock_state(&self.state);
        if st.phase.is_active() {
            log::debug!("sequencer: stopped at {}", st.generation);
        }
        st.phase = PlaybackPhase::Idle;
        st.mouth_openness = 0.0;
        st.current_word = None;
        st.words.clear();
        st.generation = self.generation;
    }

    /// Release the engine when the owning session ends.
    pub fn shutdown(&mut self) {
        log::debug!("sequencer: shutting down");
        self.stop();
    }

    /// Take the pending failure notice, if any.
    pub fn take_notice(&self) -> Option<String> {
        lock_state(&self.state).notice.take()
    }

    // -----------------------------------------------------------------------
    // Scheduling
    // -----------------------------------------------------------------------

    /// Advance to `now`.  Returns the sampled frame while speaking.
    pub fn tick(&mut self, now: Instant) -> Option<AnimationFrame> {
        self.submit_if_due(now);

        let frame = {
            let mut st = lock_state(&self.state);
            if st.phase != PlaybackPhase::Speaking {
                return None;
            }

            let frame = sample(self.clock.elapsed(now), st.words.len(), self.total);
            st.mouth_openness = frame.mouth_openness;
            if let Some(index) = frame.word_index {
                if st.current_word != Some(index) {
                    st.current_word = Some(index);
                }
            }
            frame
        };

        if frame.done {
            log::info!(
                "sequencer: {} reached the {} ms ceiling, stopping",
                self.generation,
                self.total.as_millis()
            );
            self.stop();
        }
        Some(frame)
    }

    /// Deadline of the utterance waiting out the settle delay, if any.
    pub fn next_submission(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.due)
    }

    fn submit_if_due(&mut self, now: Instant) {
        let ready = match &self.pending {
            Some(p) => p.due <= now && p.generation == self.generation,
            None => false,
        };
        // Held while paused; submitted on the first tick after resume.
        if !ready || self.phase() != PlaybackPhase::Speaking {
            return;
        }
        let Some(pending) = self.pending.take() else {
            return;
        };

        match self.session.submit(&pending.utterance, pending.generation) {
            Ok(()) => log::debug!("sequencer: {} submitted", pending.generation),
            Err(e) => self.fail(&e.to_string()),
        }
    }

    // -----------------------------------------------------------------------
    // Engine callbacks
    // -----------------------------------------------------------------------

    /// Reconcile state with an engine callback.
    pub fn handle_event(&mut self, event: EngineEvent) -> EventDisposition {
        if event.generation != self.generation {
            log::debug!(
                "sequencer: dropping stale {:?} from {} (current {})",
                event.kind,
                event.generation,
                self.generation
            );
            return EventDisposition::Stale;
        }

        if event.is_interruption() {
            log::debug!("sequencer: {} interrupted", event.generation);
            self.stop();
            return EventDisposition::Interrupted;
        }

        match event.kind {
            EngineEventKind::Started | EngineEventKind::Paused | EngineEventKind::Resumed => {
                log::debug!("sequencer: {} engine {:?}", event.generation, event.kind);
                EventDisposition::Informational
            }
            EngineEventKind::Ended => {
                log::debug!("sequencer: {} finished", event.generation);
                self.stop();
                EventDisposition::Finished
            }
            EngineEventKind::Failed(reason) => {
                self.fail(&reason);
                EventDisposition::Failed
            }
        }
    }

    fn fail(&mut self, reason: &str) {
        log::warn!("sequencer: {} speech failed: {reason}", self.generation);
        self.stop();
        lock_state(&self.state).notice = Some(FAILURE_NOTICE.to_string());
    }
}

impl Drop for Sequencer {
    fn drop(&mut self) {
        self.session.cancel();
        self.pending = None;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
