//! Speech module: delivery modes, voice selection, the utterance builder and
//! the speech-engine boundary.
//!
//! # Architecture
//!
//! ```text
//! (text, Mode, VoiceGender) ──┐
//!                             ▼
//!             build_utterance()          ◀── SpeechEngine::voices()
//!             - preamble / rate / pitch
//!             - VoiceSelector::select
//!                             │
//!                             ▼
//!                      UtteranceConfig
//!                             │
//!                             ▼
//!   SpeechEngine::speak(utterance, Generation, EventSink)
//!                             │
//!                             ▼
//!          EngineEvent { generation, Started | Ended | Failed(..) }
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use talking_avatar::speech::{
//!     build_utterance, event_channel, CommandEngine, Generation, Mode, SpeechEngine, VoiceGender,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let engine = CommandEngine::new("espeak-ng", 175);
//!     let utterance = build_utterance(
//!         "Rust makes systems programming approachable",
//!         Some(Mode::Podcast),
//!         VoiceGender::Female,
//!         &engine.voices(),
//!     );
//!
//!     let (sink, mut events) = event_channel();
//!     engine.speak(&utterance, Generation::ZERO.next(), sink).unwrap();
//!     while let Some(event) = events.recv().await {
//!         println!("{event:?}");
//!     }
//! }
//! ```

pub mod builder;
pub mod command;
pub mod engine;
pub mod mode;
pub mod voice;

// ── Public re-exports ──────────────────────────────────────────────────────

pub use builder::{build_utterance, with_preamble, UtteranceConfig, PREAMBLE_MIN_CHARS};
pub use command::{CommandEngine, SYNTHESIS_FAILED};
pub use engine::{
    event_channel, EngineError, EngineEvent, EngineEventKind, EventSink, EventStream, Generation,
    SpeechEngine, INTERRUPTED,
};
pub use mode::{Mode, UnknownMode, UnknownVoice, VoiceGender};
pub use voice::{VoiceInfo, VoiceSelector};

// test-only re-export so the pipeline tests can drive a recording engine.
#[cfg(test)]
pub use engine::{EngineCall, MockSpeechEngine};
