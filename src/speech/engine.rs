//! Speech engine boundary.
//!
//! # Overview
//!
//! [`SpeechEngine`] is the interface the sequencer uses to reach the
//! platform's synthesiser.  It is object-safe and `Send + Sync` so it can be
//! held behind an `Arc<dyn SpeechEngine>`.
//!
//! Lifecycle events are delivered asynchronously over an [`EventSink`], each
//! tagged with the [`Generation`] of the submission that produced it.  Engines
//! make no ordering promises: a cancelled utterance may still report
//! `Failed("interrupted")` after a newer one has started, which is why every
//! event carries its generation.
//!
//! [`MockSpeechEngine`] (available under `#[cfg(test)]`) records every call
//! and never produces audio.

use std::fmt;

use thiserror::Error;
use tokio::sync::mpsc;

use super::builder::UtteranceConfig;
use super::voice::VoiceInfo;

/// Failure reason reported for utterances cut short by `cancel()`.
pub const INTERRUPTED: &str = "interrupted";

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// Monotonically increasing identifier of one playback attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    pub const ZERO: Generation = Generation(0);

    pub fn next(self) -> Self {
        Generation(self.0.wrapping_add(1))
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// What happened to an utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEventKind {
    Started,
    Ended,
    Paused,
    Resumed,
    /// Synthesis stopped abnormally; the payload is the engine's reason code.
    Failed(String),
}

/// Lifecycle callback from the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineEvent {
    pub generation: Generation,
    pub kind: EngineEventKind,
}

impl EngineEvent {
    pub fn new(generation: Generation, kind: EngineEventKind) -> Self {
        Self { generation, kind }
    }

    pub fn failed(generation: Generation, reason: impl Into<String>) -> Self {
        Self::new(generation, EngineEventKind::Failed(reason.into()))
    }

    /// `true` for the failure caused by our own cancel-before-restart.
    pub fn is_interruption(&self) -> bool {
        matches!(&self.kind, EngineEventKind::Failed(reason) if reason == INTERRUPTED)
    }
}

/// Sending half handed to the engine with every submission.
pub type EventSink = mpsc::UnboundedSender<EngineEvent>;

/// Receiving half drained by the sequencer runner.
pub type EventStream = mpsc::UnboundedReceiver<EngineEvent>;

/// Create a connected sink/stream pair.
pub fn event_channel() -> (EventSink, EventStream) {
    mpsc::unbounded_channel()
}

// ---------------------------------------------------------------------------
// EngineError
// ---------------------------------------------------------------------------

/// Errors returned synchronously by engine calls.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The synthesiser program could not be launched.
    #[error("failed to start speech program `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The operation is not available on this engine or platform.
    #[error("{0} is not supported by this speech engine")]
    Unsupported(&'static str),

    /// Any other I/O failure while talking to the engine.
    #[error("speech engine I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The engine refused the submission.
    #[error("speech engine rejected the utterance: {0}")]
    Rejected(String),
}

// ---------------------------------------------------------------------------
// SpeechEngine trait
// ---------------------------------------------------------------------------

/// Object-safe, thread-safe interface to a speech synthesiser.
///
/// # Contract
///
/// - `speak` returns once the utterance is queued; progress is reported on
///   `events`, tagged with `generation`.
/// - `cancel` is best-effort and idempotent.  It may race with an in-flight
///   submission.
/// - `voices` may return an empty list (e.g. before the engine has finished
///   initialising).  Callers must not treat that as an error.
pub trait SpeechEngine: Send + Sync {
    fn speak(
        &self,
        utterance: &UtteranceConfig,
        generation: Generation,
        events: EventSink,
    ) -> Result<(), EngineError>;

    fn cancel(&self);

    fn pause(&self) -> Result<(), EngineError>;

    fn resume(&self) -> Result<(), EngineError>;

    fn voices(&self) -> Vec<VoiceInfo>;
}

// Compile-time assertion: Box<dyn SpeechEngine> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn SpeechEngine>) {}
};

// ---------------------------------------------------------------------------
// MockSpeechEngine  (test-only)
// ---------------------------------------------------------------------------

/// Call recorded by [`MockSpeechEngine`].
#[cfg(test)]
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Speak { text: String, generation: Generation },
    Cancel,
    Pause,
    Resume,
}

/// Records every call; optionally rejects submissions.
///
/// The sink of the most recent `speak` is kept so tests can play the engine's
/// side with [`emit`](Self::emit).
#[cfg(test)]
#[derive(Default)]
pub struct MockSpeechEngine {
    calls: std::sync::Mutex<Vec<EngineCall>>,
    last: std::sync::Mutex<Option<(Generation, EventSink)>>,
    catalog: Vec<VoiceInfo>,
    reject_speak: bool,
}

#[cfg(test)]
impl MockSpeechEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_voices(catalog: Vec<VoiceInfo>) -> Self {
        Self {
            catalog,
            ..Self::default()
        }
    }

    /// A mock whose `speak` always fails.
    pub fn rejecting() -> Self {
        Self {
            reject_speak: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn spoken(&self) -> Vec<(String, Generation)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                EngineCall::Speak { text, generation } => Some((text, generation)),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, call: &EngineCall) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }

    /// Send `kind` for the most recent submission.  Returns `false` when
    /// nothing has been spoken yet.
    pub fn emit(&self, kind: EngineEventKind) -> bool {
        match self.last.lock().unwrap().as_ref() {
            Some((generation, sink)) => sink.send(EngineEvent::new(*generation, kind)).is_ok(),
            None => false,
        }
    }

    fn record(&self, call: EngineCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[cfg(test)]
impl SpeechEngine for MockSpeechEngine {
    fn speak(
        &self,
        utterance: &UtteranceConfig,
        generation: Generation,
        events: EventSink,
    ) -> Result<(), EngineError> {
        if self.reject_speak {
            return Err(EngineError::Rejected("mock refuses to speak".into()));
        }
        self.record(EngineCall::Speak {
            text: utterance.text.clone(),
            generation,
        });
        let _ = events.send(EngineEvent::new(generation, EngineEventKind::Started));
        *self.last.lock().unwrap() = Some((generation, events));
        Ok(())
    }

    fn cancel(&self) {
        self.record(EngineCall::Cancel);
    }

    fn pause(&self) -> Result<(), EngineError> {
        self.record(EngineCall::Pause);
        Ok(())
    }

    fn resume(&self) -> Result<(), EngineError> {
        self.record(EngineCall::Resume);
        Ok(())
    }

    fn voices(&self) -> Vec<VoiceInfo> {
        self.catalog.clone()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
