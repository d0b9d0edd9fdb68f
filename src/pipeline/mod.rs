//! Playback pipeline: shared state, the sequencer state machine and the async
//! runner that schedules it.
//!
//! # Architecture
//!
//! ```text
//! SequencerCommand (mpsc, from the UI)
//!        │
//!        ▼
//! SequencerRunner::run()  ← async tokio task
//!        │
//!        ├─ Start  → Sequencer::start   → cancel, Speaking, queue utterance
//!        ├─ Pause / Resume / Stop
//!        ├─ tick   → Sequencer::tick    → submit when settled, sample mouth/word
//!        └─ EngineEvent → Sequencer::handle_event (stale generations dropped)
//!
//! Sequencer ──▶ SpeechSession ──▶ Arc<dyn SpeechEngine>
//!
//! SharedState (Arc<Mutex<PlaybackState>>) ←─── read by egui update() each frame
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tokio::sync::mpsc;
//! use talking_avatar::config::AppConfig;
//! use talking_avatar::pipeline::{new_shared_state, SequencerCommand, SequencerRunner, SpeechRequest};
//! use talking_avatar::speech::{CommandEngine, VoiceGender};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let shared_state = new_shared_state();
//!     let engine = Arc::new(CommandEngine::from_config(&config.speech));
//!
//!     let (command_tx, command_rx) = mpsc::channel(16);
//!     let runner = SequencerRunner::new(shared_state.clone(), engine, &config.speech);
//!     tokio::spawn(runner.run(command_rx));
//!
//!     command_tx
//!         .send(SequencerCommand::Start(SpeechRequest::new(
//!             "Hello from the avatar",
//!             Some(config.speech.default_mode),
//!             VoiceGender::Female,
//!         )))
//!         .await
//!         .unwrap();
//! }
//! ```

pub mod runner;
pub mod sequencer;
pub mod session;
pub mod state;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use runner::{SequencerCommand, SequencerRunner};
pub use sequencer::{EventDisposition, Sequencer, SpeechRequest, StartOutcome, FAILURE_NOTICE};
pub use session::SpeechSession;
pub use state::{lock_state, new_shared_state, PlaybackPhase, PlaybackState, SharedState};
