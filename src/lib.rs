//! Talking avatar: a text-to-speech playback sequencer that drives a
//! word-synchronised mouth animation, plus a small HTTP broker that hands
//! out third-party TTS URLs.
//!
//! ```text
//!  AvatarApp (egui) ──SequencerCommand──► SequencerRunner ──► SpeechEngine
//!        ▲                                   │      ▲            │
//!        └────────── SharedState ◄───────────┘      └─EngineEvent┘
//! ```

pub mod animation;
pub mod app;
pub mod broker;
pub mod config;
pub mod pipeline;
pub mod speech;
