//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.
//! Every section is `#[serde(default)]`, so a partial `settings.toml` only
//! overrides the keys it names.

use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;
use crate::speech::{Mode, VoiceGender};

/// Environment variable that overrides [`BrokerConfig::port`].
pub const PORT_ENV: &str = "PORT";

/// Environment variable that overrides [`BrokerConfig::voicerss_api_key`].
pub const VOICERSS_KEY_ENV: &str = "VOICERSS_API_KEY";

// ---------------------------------------------------------------------------
// SpeechConfig
// ---------------------------------------------------------------------------

/// Settings for the speech engine and the playback sequencer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Mode preselected in the UI.
    pub default_mode: Mode,
    /// Voice gender preselected in the UI.
    pub default_voice: VoiceGender,
    /// Delay between cancelling the engine and submitting the next utterance.
    pub settle_delay_ms: u64,
    /// Hard ceiling on one animation run; playback is stopped when reached.
    pub max_animation_ms: u64,
    /// Animation sampling rate of the sequencer runner.
    pub tick_hz: u32,
    /// Synthesiser executable (`espeak-ng` compatible command line).
    pub program: String,
    /// Words per minute at rate 1.0.
    pub base_wpm: u32,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            default_mode: Mode::default(),
            default_voice: VoiceGender::default(),
            settle_delay_ms: 100,
            max_animation_ms: 10_000,
            tick_hz: 60,
            program: "espeak-ng".into(),
            base_wpm: 175,
        }
    }
}

impl SpeechConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn max_animation(&self) -> Duration {
        Duration::from_millis(self.max_animation_ms)
    }

    /// Period of the sampling timer; a zero rate is treated as 1 Hz.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.tick_hz.max(1)))
    }
}

// ---------------------------------------------------------------------------
// BrokerConfig
// ---------------------------------------------------------------------------

/// Settings for the `tts-broker` HTTP service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    /// Interface to bind.
    pub host: String,
    /// TCP port; `PORT` in the environment takes precedence.
    pub port: u16,
    /// Timeout of the reachability `HEAD` probe.
    pub probe_timeout_ms: u64,
    /// Base URL of the VoiceRSS API.
    pub voicerss_url: String,
    /// VoiceRSS API key; `VOICERSS_API_KEY` in the environment takes
    /// precedence.
    pub voicerss_api_key: String,
    /// VoiceRSS language code.
    pub language: String,
    /// Base URL of the keyless fallback provider.
    pub fallback_url: String,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 5000,
            probe_timeout_ms: 1_500,
            voicerss_url: "https://api.voicerss.org/".into(),
            voicerss_api_key: String::new(),
            language: "en-us".into(),
            fallback_url: "https://tiktok-tts.weilnet.workers.dev/api/generation".into(),
        }
    }
}

impl BrokerConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    /// `host:port` for the listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Apply `PORT` / `VOICERSS_API_KEY` from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from `lookup`.  An unparsable port is ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(raw) = lookup(PORT_ENV) {
            match raw.trim().parse::<u16>() {
                Ok(port) => self.port = port,
                Err(_) => log::warn!("config: ignoring invalid {PORT_ENV}={raw:?}"),
            }
        }
        if let Some(key) = lookup(VOICERSS_KEY_ENV).filter(|k| !k.is_empty()) {
            self.voicerss_api_key = key;
        }
    }
}

// ---------------------------------------------------------------------------
// UiConfig
// ---------------------------------------------------------------------------

/// egui window appearance and behaviour settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Last saved window position `(x, y)` in screen pixels.  `None` means
    /// let the window manager pick a position on first launch.
    pub window_position: Option<(f32, f32)>,
    /// Keep the window floating above all other windows.
    pub always_on_top: bool,
    /// Text placed in the text box on launch.
    pub initial_text: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            window_position: None,
            always_on_top: false,
            initial_text: "Welcome to this text-to-speech demo. \
                           Try typing your own text and see the avatar speak!"
                .into(),
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use talking_avatar::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Speech engine and sequencer settings.
    pub speech: SpeechConfig,
    /// URL broker settings.
    pub broker: BrokerConfig,
    /// UI / window settings.
    pub ui: UiConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet
    /// (first-run scenario) so callers never need to special-case a missing
    /// file.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn round_trip_toml() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");

        let original = AppConfig::default();
        original.save_to(&path).expect("save");

        let loaded = AppConfig::load_from(&path).expect("load");
        assert_eq!(original, loaded);
    }

    /// `load_from` on a non-existent path must return `Default` without error.
    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");

        let config = AppConfig::load_from(&path).expect("should not error");
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn default_values() {
        let cfg = AppConfig::default();

        assert_eq!(cfg.speech.default_mode, Mode::News);
        assert_eq!(cfg.speech.default_voice, VoiceGender::Male);
        assert_eq!(cfg.speech.settle_delay(), Duration::from_millis(100));
        assert_eq!(cfg.speech.max_animation(), Duration::from_secs(10));
        assert_eq!(cfg.speech.tick_hz, 60);
        assert_eq!(cfg.speech.program, "espeak-ng");
        assert_eq!(cfg.broker.port, 5000);
        assert_eq!(cfg.broker.probe_timeout(), Duration::from_millis(1_500));
        assert_eq!(cfg.broker.language, "en-us");
        assert!(cfg.ui.initial_text.starts_with("Welcome to this text-to-speech demo."));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("partial.toml");
        std::fs::write(&path, "[speech]\ndefault_mode = \"podcast\"\n").unwrap();

        let cfg = AppConfig::load_from(&path).expect("load");
        assert_eq!(cfg.speech.default_mode, Mode::Podcast);
        assert_eq!(cfg.speech.settle_delay_ms, 100);
        assert_eq!(cfg.broker, BrokerConfig::default());
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[speech\nprogram = ").unwrap();

        assert!(AppConfig::load_from(&path).is_err());
    }

    #[test]
    fn round_trip_modified_values() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nested/dir/modified.toml");

        let mut cfg = AppConfig::default();
        cfg.speech.default_mode = Mode::Vlogging;
        cfg.speech.default_voice = VoiceGender::Female;
        cfg.speech.program = "/usr/local/bin/espeak".into();
        cfg.broker.port = 8080;
        cfg.broker.voicerss_api_key = "abc123".into();
        cfg.ui.window_position = Some((100.0, 200.0));

        cfg.save_to(&path).expect("save");
        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(loaded.speech.default_mode, Mode::Vlogging);
        assert_eq!(loaded.speech.default_voice, VoiceGender::Female);
        assert_eq!(loaded.speech.program, "/usr/local/bin/espeak");
        assert_eq!(loaded.broker.port, 8080);
        assert_eq!(loaded.broker.voicerss_api_key, "abc123");
        assert_eq!(loaded.ui.window_position, Some((100.0, 200.0)));
    }

    #[test]
    fn env_overrides_port_and_key() {
        let mut cfg = BrokerConfig::default();
        cfg.apply_overrides(|key| match key {
            PORT_ENV => Some("8123".into()),
            VOICERSS_KEY_ENV => Some("secret".into()),
            _ => None,
        });
        assert_eq!(cfg.port, 8123);
        assert_eq!(cfg.voicerss_api_key, "secret");
        assert_eq!(cfg.bind_addr(), "0.0.0.0:8123");
    }

    #[test]
    fn invalid_port_override_is_ignored() {
        let mut cfg = BrokerConfig::default();
        cfg.apply_overrides(|key| (key == PORT_ENV).then(|| "eighty".to_string()));
        assert_eq!(cfg.port, 5000);
    }

    #[test]
    fn tick_interval_from_rate() {
        let mut speech = SpeechConfig::default();
        speech.tick_hz = 50;
        assert_eq!(speech.tick_interval(), Duration::from_millis(20));
        speech.tick_hz = 0;
        assert_eq!(speech.tick_interval(), Duration::from_secs(1));
    }
}
