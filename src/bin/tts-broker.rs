//! TTS URL broker entry point.
//!
//! Loads the `[broker]` section of `settings.toml`, applies the `PORT` and
//! `VOICERSS_API_KEY` environment overrides, then serves until Ctrl-C.

use talking_avatar::config::{AppConfig, VOICERSS_KEY_ENV};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut config = AppConfig::load()
        .unwrap_or_else(|e| {
            log::warn!("Failed to load config ({e}); using defaults");
            AppConfig::default()
        })
        .broker;
    config.apply_env();

    if config.voicerss_api_key.is_empty() {
        log::warn!("{VOICERSS_KEY_ENV} is not set; VoiceRSS URLs will carry an empty key");
    }

    talking_avatar::broker::serve(config).await
}
