//! Talking-avatar window: egui/eframe application.
//!
//! # Architecture
//!
//! [`AvatarApp`] is the top-level [`eframe::App`].  It never touches the
//! speech engine.  It holds:
//!
//! * `state`     : the [`SharedState`] published by the sequencer, read
//!   every frame to draw the face, the word strip and the buttons.
//! * `command_tx`: sends [`SequencerCommand`]s to the sequencer runner.
//!
//! # Layout
//!
//! | Area        | Content                                               |
//! |-------------|-------------------------------------------------------|
//! | Face        | Head, eyes and a mouth whose height is `mouth_openness` |
//! | Word strip  | Snapshot of the spoken words, current word highlighted |
//! | Text box    | Text to speak (editable while speaking)               |
//! | Mode / voice| News · Podcast · Vlog, Male · Female                  |
//! | Controls    | Speak/Stop, Pause/Resume                              |
//! | Notice      | Failure banner, dismissed after a few seconds         |

use std::time::{Duration, Instant};

use eframe::egui;
use tokio::sync::mpsc;

use crate::config::AppConfig;
use crate::pipeline::{lock_state, PlaybackPhase, PlaybackState, SequencerCommand, SharedState, SpeechRequest};
use crate::speech::{Mode, VoiceGender};

/// How long a failure notice stays on screen.
const NOTICE_TTL: Duration = Duration::from_secs(5);

/// Mouth height in points at openness 0 and 100.
const MOUTH_MIN_HEIGHT: f32 = 4.0;
const MOUTH_MAX_HEIGHT: f32 = 36.0;

// ---------------------------------------------------------------------------
// Control labels
// ---------------------------------------------------------------------------

/// Label of the main button: the same button starts and stops.
pub fn primary_label(phase: PlaybackPhase) -> &'static str {
    if phase.is_active() {
        "Stop"
    } else {
        "Speak"
    }
}

/// Command sent by the main button, or `None` while it is disabled.
///
/// While a playback is active the button always stops it, whatever the text
/// box holds.
pub fn primary_command(
    phase: PlaybackPhase,
    text: &str,
    mode: Mode,
    voice: VoiceGender,
) -> Option<SequencerCommand> {
    if phase.is_active() {
        Some(SequencerCommand::Stop)
    } else if text.trim().is_empty() {
        None
    } else {
        Some(SequencerCommand::Start(SpeechRequest::new(text, Some(mode), voice)))
    }
}

/// Label of the pause button, or `None` when it should be hidden.
pub fn pause_label(phase: PlaybackPhase) -> Option<&'static str> {
    match phase {
        PlaybackPhase::Idle => None,
        PlaybackPhase::Speaking => Some("Pause"),
        PlaybackPhase::Paused => Some("Resume"),
    }
}

/// Mouth height for `openness` in `[0, 100]`.
pub fn mouth_height(openness: f32) -> f32 {
    let t = (openness / 100.0).clamp(0.0, 1.0);
    MOUTH_MIN_HEIGHT + t * (MOUTH_MAX_HEIGHT - MOUTH_MIN_HEIGHT)
}

// ---------------------------------------------------------------------------
// AvatarApp
// ---------------------------------------------------------------------------

/// eframe application: the talking avatar window.
pub struct AvatarApp {
    // ── Shared with the sequencer ────────────────────────────────────────
    state: SharedState,
    command_tx: mpsc::Sender<SequencerCommand>,

    // ── Form ─────────────────────────────────────────────────────────────
    text: String,
    mode: Mode,
    voice: VoiceGender,

    // ── Notice banner ────────────────────────────────────────────────────
    notice: Option<(String, Instant)>,
    /// The sequencer's current notice has been picked up and dismissed.
    notice_taken: bool,

    /// Application configuration (read-only after startup).
    pub config: AppConfig,
}

impl AvatarApp {
    /// Create a new [`AvatarApp`].
    ///
    /// * `state`     : shared playback state published by the sequencer.
    /// * `command_tx`: sender end of the sequencer command channel.
    /// * `config`    : loaded application configuration.
    pub fn new(
        state: SharedState,
        command_tx: mpsc::Sender<SequencerCommand>,
        config: AppConfig,
    ) -> Self {
        Self {
            state,
            command_tx,
            text: config.ui.initial_text.clone(),
            mode: config.speech.default_mode,
            voice: config.speech.default_voice,
            notice: None,
            notice_taken: false,
            config,
        }
    }

    fn send(&self, command: SequencerCommand) {
        if let Err(e) = self.command_tx.try_send(command) {
            log::warn!("ui: dropped sequencer command: {e}");
        }
    }

    // ── Notice handling ──────────────────────────────────────────────────

    /// Pick up a fresh notice from `snapshot`, ask the sequencer to clear
    /// it, and expire old ones.
    fn poll_notice(&mut self, snapshot: &PlaybackState) {
        match &snapshot.notice {
            Some(message) if !self.notice_taken => {
                self.notice = Some((message.clone(), Instant::now()));
                self.notice_taken = true;
                self.send(SequencerCommand::DismissNotice);
            }
            Some(_) => {}
            None => self.notice_taken = false,
        }
        if self
            .notice
            .as_ref()
            .is_some_and(|(_, shown)| shown.elapsed() >= NOTICE_TTL)
        {
            self.notice = None;
        }
    }

    // ── Panels ───────────────────────────────────────────────────────────

    /// Paint the avatar face.
    fn draw_face(&self, ui: &mut egui::Ui, snapshot: &PlaybackState) {
        let (rect, _) =
            ui.allocate_exact_size(egui::vec2(ui.available_width(), 180.0), egui::Sense::hover());
        let painter = ui.painter();

        let center = rect.center();
        let radius = 80.0;
        let skin = egui::Color32::from_rgb(240, 200, 160);
        let ink = egui::Color32::from_rgb(60, 40, 30);

        painter.circle_filled(center, radius, skin);
        painter.circle_stroke(center, radius, egui::Stroke::new(2.0, ink));

        for dx in [-28.0, 28.0] {
            painter.circle_filled(center + egui::vec2(dx, -22.0), 7.0, ink);
        }

        let height = mouth_height(snapshot.mouth_openness);
        let mouth = egui::Rect::from_center_size(
            center + egui::vec2(0.0, 36.0),
            egui::vec2(44.0, height),
        );
        painter.rect_filled(mouth, height / 2.0, egui::Color32::from_rgb(150, 40, 50));
    }

    /// Words of the current playback with the active one highlighted.
    fn draw_words(&self, ui: &mut egui::Ui, snapshot: &PlaybackState) {
        if snapshot.words.is_empty() {
            ui.add_space(18.0);
            return;
        }
        ui.horizontal_wrapped(|ui| {
            for (i, word) in snapshot.words.iter().enumerate() {
                let text = egui::RichText::new(word.as_str()).size(14.0);
                let text = if snapshot.current_word == Some(i) {
                    text.strong()
                        .color(egui::Color32::from_rgb(30, 30, 30))
                        .background_color(egui::Color32::from_rgb(255, 220, 90))
                } else {
                    text.color(egui::Color32::from_rgb(170, 170, 170))
                };
                ui.label(text);
            }
        });
    }

    /// Mode and voice pickers.  Locked while a playback is active.
    fn draw_options(&mut self, ui: &mut egui::Ui, active: bool) {
        ui.add_enabled_ui(!active, |ui| {
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new("Mode:").size(12.0));
                for mode in Mode::ALL {
                    ui.selectable_value(&mut self.mode, mode, mode.label());
                }
            });
            ui.label(
                egui::RichText::new(self.mode.description())
                    .color(egui::Color32::from_rgb(140, 140, 140))
                    .italics()
                    .size(11.0),
            );

            ui.horizontal(|ui| {
                ui.label(egui::RichText::new("Voice:").size(12.0));
                for voice in VoiceGender::ALL {
                    ui.selectable_value(&mut self.voice, voice, voice.label());
                }
            });
        });
    }

    /// Speak/Stop and Pause/Resume.
    fn draw_controls(&mut self, ui: &mut egui::Ui, phase: PlaybackPhase) {
        ui.horizontal(|ui| {
            let command = primary_command(phase, &self.text, self.mode, self.voice);
            let primary = ui.add_enabled(
                command.is_some(),
                egui::Button::new(egui::RichText::new(primary_label(phase)).size(14.0)),
            );
            if primary.clicked() {
                if let Some(command) = command {
                    self.send(command);
                }
            }

            if let Some(label) = pause_label(phase) {
                if ui
                    .add(egui::Button::new(egui::RichText::new(label).size(14.0)))
                    .clicked()
                {
                    self.send(match phase {
                        PlaybackPhase::Paused => SequencerCommand::Resume,
                        _ => SequencerCommand::Pause,
                    });
                }
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(
                    egui::RichText::new(phase.label())
                        .color(egui::Color32::from_rgb(120, 120, 120))
                        .size(11.0),
                );
            });
        });
    }

    fn draw_notice(&mut self, ui: &mut egui::Ui) {
        let Some((message, _)) = self.notice.clone() else {
            return;
        };
        ui.add_space(4.0);
        ui.horizontal(|ui| {
            ui.label(
                egui::RichText::new(message)
                    .color(egui::Color32::from_rgb(255, 136, 68))
                    .size(12.0),
            );
            if ui
                .add(egui::Button::new(egui::RichText::new("x").size(11.0)).frame(false))
                .clicked()
            {
                self.notice = None;
            }
        });
    }
}

// ---------------------------------------------------------------------------
// eframe::App impl
// ---------------------------------------------------------------------------

impl eframe::App for AvatarApp {
    /// Called every frame by eframe.  Copies the playback state, schedules
    /// repaints, then renders the window.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let snapshot = lock_state(&self.state).clone();
        self.poll_notice(&snapshot);

        // --- Schedule repaints while the avatar is animated ---------------
        match snapshot.phase {
            PlaybackPhase::Speaking => ctx.request_repaint_after(Duration::from_millis(16)),
            PlaybackPhase::Paused => ctx.request_repaint_after(Duration::from_millis(100)),
            PlaybackPhase::Idle if self.notice.is_some() => {
                ctx.request_repaint_after(Duration::from_millis(500))
            }
            PlaybackPhase::Idle => {}
        }

        let frame = egui::Frame::new()
            .fill(egui::Color32::from_rgb(30, 30, 30))
            .corner_radius(egui::CornerRadius::same(8))
            .inner_margin(egui::Margin::same(12));

        egui::CentralPanel::default().frame(frame).show(ctx, |ui| {
            self.draw_face(ui, &snapshot);
            self.draw_words(ui, &snapshot);
            ui.separator();

            ui.add(
                egui::TextEdit::multiline(&mut self.text)
                    .desired_rows(3)
                    .desired_width(f32::INFINITY)
                    .hint_text("Type something for the avatar to say"),
            );
            ui.add_space(4.0);

            self.draw_options(ui, snapshot.phase.is_active());
            ui.add_space(4.0);
            self.draw_controls(ui, snapshot.phase);
            self.draw_notice(ui);
        });
    }

    /// Stop any playback when the window closes.
    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        log::info!("talking avatar closing");
        self.send(SequencerCommand::Stop);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_button_toggles_between_speak_and_stop() {
        assert_eq!(primary_label(PlaybackPhase::Idle), "Speak");
        assert_eq!(primary_label(PlaybackPhase::Speaking), "Stop");
        assert_eq!(primary_label(PlaybackPhase::Paused), "Stop");
    }

    #[test]
    fn main_button_stops_an_active_playback_even_with_blank_text() {
        for phase in [PlaybackPhase::Speaking, PlaybackPhase::Paused] {
            for text in ["", "   ", "Hello there"] {
                assert_eq!(
                    primary_command(phase, text, Mode::News, VoiceGender::Male),
                    Some(SequencerCommand::Stop),
                    "{phase:?} {text:?}"
                );
            }
        }
    }

    #[test]
    fn main_button_starts_only_with_text() {
        assert_eq!(primary_command(PlaybackPhase::Idle, "  ", Mode::News, VoiceGender::Male), None);
        assert_eq!(
            primary_command(PlaybackPhase::Idle, "Hi there", Mode::Vlogging, VoiceGender::Female),
            Some(SequencerCommand::Start(SpeechRequest::new(
                "Hi there",
                Some(Mode::Vlogging),
                VoiceGender::Female,
            )))
        );
    }

    #[test]
    fn notice_is_shown_and_dismissed_once() {
        let state = crate::pipeline::new_shared_state();
        let (tx, mut rx) = mpsc::channel(4);
        let mut app = AvatarApp::new(state.clone(), tx, AppConfig::default());

        lock_state(&state).notice = Some("boom".into());
        let snapshot = lock_state(&state).clone();
        app.poll_notice(&snapshot);
        app.poll_notice(&snapshot);

        assert_eq!(app.notice.as_ref().map(|(m, _)| m.as_str()), Some("boom"));
        assert_eq!(rx.try_recv().unwrap(), SequencerCommand::DismissNotice);
        assert!(rx.try_recv().is_err());
        // The UI only reads the shared state.
        assert!(lock_state(&state).notice.is_some());

        // Once cleared, the next notice is picked up again.
        lock_state(&state).notice = None;
        app.poll_notice(&lock_state(&state).clone());
        lock_state(&state).notice = Some("again".into());
        app.poll_notice(&lock_state(&state).clone());
        assert_eq!(rx.try_recv().unwrap(), SequencerCommand::DismissNotice);
        assert_eq!(app.notice.as_ref().map(|(m, _)| m.as_str()), Some("again"));
    }

    #[test]
    fn pause_button_only_while_active() {
        assert_eq!(pause_label(PlaybackPhase::Idle), None);
        assert_eq!(pause_label(PlaybackPhase::Speaking), Some("Pause"));
        assert_eq!(pause_label(PlaybackPhase::Paused), Some("Resume"));
    }

    #[test]
    fn mouth_height_is_bounded() {
        assert_eq!(mouth_height(0.0), MOUTH_MIN_HEIGHT);
        assert_eq!(mouth_height(100.0), MOUTH_MAX_HEIGHT);
        assert_eq!(mouth_height(250.0), MOUTH_MAX_HEIGHT);
        assert!(mouth_height(50.0) > MOUTH_MIN_HEIGHT);
    }

    #[test]
    fn form_starts_from_config() {
        let mut config = AppConfig::default();
        config.speech.default_mode = Mode::Podcast;
        config.speech.default_voice = VoiceGender::Female;
        let (tx, _rx) = mpsc::channel(1);

        let app = AvatarApp::new(crate::pipeline::new_shared_state(), tx, config);
        assert_eq!(app.mode, Mode::Podcast);
        assert_eq!(app.voice, VoiceGender::Female);
        assert!(app.text.starts_with("Welcome"));
    }

    #[test]
    fn full_command_channel_does_not_panic() {
        let (tx, _rx) = mpsc::channel(1);
        let app = AvatarApp::new(crate::pipeline::new_shared_state(), tx, AppConfig::default());
        app.send(SequencerCommand::Stop);
        app.send(SequencerCommand::Stop);
    }
}
