//! Sequencer runner: schedules the [`Sequencer`] on the tokio runtime.
//!
//! [`SequencerRunner`] owns the sequencer and the engine event stream and
//! multiplexes three sources:
//!
//! ```text
//! SequencerCommand (mpsc, from the UI) ──┐
//! EngineEvent      (mpsc, from engine) ──┼─▶ select! ─▶ Sequencer
//! interval         (tick_hz, Skip)     ──┘
//! ```
//!
//! The fixed-rate interval replaces a display-refresh callback: each tick
//! samples the animation from wall-clock elapsed time, so a late or skipped
//! tick never distorts the mouth curve or the word index.
//!
//! When the command channel closes (the UI went away) the runner calls
//! [`Sequencer::shutdown`], which cancels the engine unconditionally.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::config::SpeechConfig;
use crate::speech::{event_channel, EventStream, SpeechEngine};

use super::sequencer::{Sequencer, SpeechRequest};
use super::session::SpeechSession;
use super::state::SharedState;

// ---------------------------------------------------------------------------
// SequencerCommand
// ---------------------------------------------------------------------------

/// Control requests sent by the UI.
#[derive(Debug, Clone, PartialEq)]
pub enum SequencerCommand {
    /// Speak, or stop if something is already playing.
    Start(SpeechRequest),
    Pause,
    Resume,
    Stop,
    /// The UI has shown the failure notice; clear it.
    DismissNotice,
}

// ---------------------------------------------------------------------------
// SequencerRunner
// ---------------------------------------------------------------------------

/// Async driver for one [`Sequencer`].
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use talking_avatar::config::AppConfig;
/// use talking_avatar::pipeline::{new_shared_state, SequencerCommand, SequencerRunner, SpeechRequest};
/// use talking_avatar::speech::{CommandEngine, Mode, VoiceGender};
///
/// # async fn example() {
/// let config = AppConfig::default();
/// let state = new_shared_state();
/// let engine = Arc::new(CommandEngine::from_config(&config.speech));
///
/// let (tx, rx) = tokio::sync::mpsc::channel(16);
/// let runner = SequencerRunner::new(state, engine, &config.speech);
/// tokio::spawn(runner.run(rx));
///
/// tx.send(SequencerCommand::Start(SpeechRequest::new(
///     "Hello there",
///     Some(Mode::News),
///     VoiceGender::Male,
/// )))
/// .await
/// .unwrap();
/// # }
/// ```
pub struct SequencerRunner {
    sequencer: Sequencer,
    events: EventStream,
    tick: Duration,
}

impl SequencerRunner {
    /// Create a runner whose sequencer publishes to `state` and speaks
    /// through `engine`.
    pub fn new(state: SharedState, engine: Arc<dyn SpeechEngine>, config: &SpeechConfig) -> Self {
        let (sink, events) = event_channel();
        let session = SpeechSession::new(engine, sink);
        Self {
            sequencer: Sequencer::new(state, session, config),
            events,
            tick: config.tick_interval(),
        }
    }

    /// Run until `commands` is closed, then tear down.
    pub async fn run(mut self, mut commands: mpsc::Receiver<SequencerCommand>) {
        let mut ticker = tokio::time::interval(self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        log::info!(
            "runner: sampling every {:.1} ms",
            self.tick.as_secs_f64() * 1000.0
        );

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                Some(event) = self.events.recv() => {
                    self.sequencer.handle_event(event);
                }
                _ = ticker.tick() => {
                    self.sequencer.tick(Instant::now());
                }
            }
        }

        log::info!("runner: command channel closed, shutting down");
        self.sequencer.shutdown();
    }

    fn handle_command(&mut self, command: SequencerCommand) {
        let now = Instant::now();
        match command {
            SequencerCommand::Start(request) => {
                let outcome = self.sequencer.start(request, now);
                log::debug!("runner: start → {outcome:?}");
            }
            SequencerCommand::Pause => {
                self.sequencer.pause(now);
            }
            SequencerCommand::Resume => {
                self.sequencer.resume(now);
            }
            SequencerCommand::Stop => self.sequencer.stop(),
            SequencerCommand::DismissNotice => {
                if let Some(notice) = self.sequencer.take_notice() {
                    log::debug!("runner: notice dismissed: {notice}");
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
