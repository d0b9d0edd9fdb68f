//! Session-scoped handle to the speech engine.
//!
//! The engine is process-wide state.  [`SpeechSession`] is the only thing
//! that touches it: the sequencer owns one session and every submission,
//! cancellation and catalog lookup goes through it.  Events for every
//! submission are routed to the session's single [`EventSink`].

use std::sync::Arc;

use crate::speech::{EngineError, EventSink, Generation, SpeechEngine, UtteranceConfig, VoiceInfo};

pub struct SpeechSession {
    engine: Arc<dyn SpeechEngine>,
    events: EventSink,
}

impl SpeechSession {
    pub fn new(engine: Arc<dyn SpeechEngine>, events: EventSink) -> Self {
        Self { engine, events }
    }

    /// Submit `utterance` tagged with `generation`.
    pub fn submit(
        &self,
        utterance: &UtteranceConfig,
        generation: Generation,
    ) -> Result<(), EngineError> {
        self.engine.speak(utterance, generation, self.events.clone())
    }

    pub fn cancel(&self) {
        self.engine.cancel();
    }

    pub fn pause(&self) -> Result<(), EngineError> {
        self.engine.pause()
    }

    pub fn resume(&self) -> Result<(), EngineError> {
        self.engine.resume()
    }

    /// Current voice catalog; may be empty.
    pub fn voices(&self) -> Vec<VoiceInfo> {
        self.engine.voices()
    }
}

impl std::fmt::Debug for SpeechSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechSession").finish_non_exhaustive()
    }
}
