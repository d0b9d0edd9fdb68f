//! Application entry point: Talking Avatar.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Create [`tokio`] runtime (multi-thread, 2 workers).
//! 4. Build the speech engine ([`CommandEngine`]) from config.
//! 5. Spawn the sequencer runner on the tokio runtime.
//! 6. Run [`eframe::run_native`]: blocks the main thread until the window
//!    is closed.
//! 7. Give the runner a moment to cancel any playback still in flight.

use std::sync::Arc;
use std::time::Duration;

use eframe::egui;
use tokio::sync::mpsc;
use talking_avatar::{
    app::AvatarApp,
    config::AppConfig,
    pipeline::{new_shared_state, SequencerCommand, SequencerRunner},
    speech::{CommandEngine, SpeechEngine},
};

// ---------------------------------------------------------------------------
// Native options builder
// ---------------------------------------------------------------------------

fn native_options(config: &AppConfig) -> eframe::NativeOptions {
    let mut vp = egui::ViewportBuilder::default()
        .with_inner_size([420.0, 520.0])
        .with_min_inner_size([320.0, 420.0]);

    if config.ui.always_on_top {
        vp = vp.with_always_on_top();
    }

    if let Some((x, y)) = config.ui.window_position {
        vp = vp.with_position(egui::pos2(x, y));
    }

    eframe::NativeOptions {
        viewport: vp,
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> eframe::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Talking Avatar starting up");

    // 2. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });

    // 3. Tokio runtime (engine child processes + sequencer loop)
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .map_err(|e| eframe::Error::AppCreation(Box::new(e)))?;

    // 4. Speech engine
    let engine: Arc<dyn SpeechEngine> = Arc::new(CommandEngine::from_config(&config.speech));
    if engine.voices().is_empty() {
        log::warn!(
            "No voices reported by `{}`; speech will use the engine default",
            config.speech.program
        );
    }

    // 5. Sequencer runner
    let state = new_shared_state();
    let (command_tx, command_rx) = mpsc::channel::<SequencerCommand>(16);
    let runner = rt.spawn(
        SequencerRunner::new(Arc::clone(&state), engine, &config.speech).run(command_rx),
    );

    // 6. Build the egui app and run it (blocks until the window is closed)
    let app = AvatarApp::new(state, command_tx, config.clone());
    let options = native_options(&config);

    let result = eframe::run_native(
        "Talking Avatar",
        options,
        Box::new(move |_cc| Ok(Box::new(app))),
    );

    // 7. The app (and with it the command sender) is gone; the runner stops
    //    the engine on its way out.
    if rt
        .block_on(async { tokio::time::timeout(Duration::from_secs(1), runner).await })
        .is_err()
    {
        log::warn!("Sequencer did not shut down in time");
    }

    result
}
