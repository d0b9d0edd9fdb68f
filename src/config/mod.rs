//! Configuration module for the talking avatar.
//!
//! Provides `AppConfig` (top-level settings), sub-configs for the sequencer,
//! the broker and the UI, `AppPaths` for the platform config directory, and
//! TOML persistence via `AppConfig::load` / `AppConfig::save`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{AppConfig, BrokerConfig, SpeechConfig, UiConfig, PORT_ENV, VOICERSS_KEY_ENV};
