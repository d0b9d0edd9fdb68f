//! Provider URL construction and primary/fallback selection.
//!
//! Two third-party services are offered to the client:
//!
//! | Provider   | URL                                                        |
//! |------------|------------------------------------------------------------|
//! | VoiceRSS   | `<voicerss_url>?key=…&hl=…&v=John\|Mary&src=<text>`        |
//! | freettsapi | `<fallback_url>?text=<text>&voice=en_us_001\|en_us_002`    |
//!
//! Query values are form-urlencoded.

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::config::BrokerConfig;
use crate::speech::VoiceGender;

use super::error::BrokerError;

/// Which service ended up as the primary URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Provider {
    #[serde(rename = "voicerss")]
    VoiceRss,
    #[serde(rename = "freettsapi")]
    FreeTtsApi,
}

/// Response body of `POST /generate-speech`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechUrls {
    pub audio_url: String,
    pub fallback_url: String,
    pub provider: Provider,
}

/// Both provider URLs for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderUrls {
    pub voicerss: Url,
    pub fallback: Url,
}

impl ProviderUrls {
    /// Build the VoiceRSS and fallback URLs for `text` spoken by `voice`.
    ///
    /// `voice` is the raw request value.  VoiceRSS uses `Mary` only for
    /// `female`; the fallback uses `en_us_001` only for `male`.
    pub fn build(config: &BrokerConfig, text: &str, voice: &str) -> Result<Self, BrokerError> {
        let gender = voice.parse::<VoiceGender>().ok();

        let voicerss_voice = match gender {
            Some(VoiceGender::Female) => "Mary",
            _ => "John",
        };
        let fallback_voice = match gender {
            Some(VoiceGender::Male) => "en_us_001",
            _ => "en_us_002",
        };

        let voicerss = parse_with(
            &config.voicerss_url,
            &[
                ("key", config.voicerss_api_key.as_str()),
                ("hl", config.language.as_str()),
                ("v", voicerss_voice),
                ("src", text),
            ],
        )?;
        let fallback = parse_with(&config.fallback_url, &[("text", text), ("voice", fallback_voice)])?;

        Ok(Self { voicerss, fallback })
    }

    /// Order the pair by the VoiceRSS reachability result.
    pub fn select(self, voicerss_reachable: bool) -> SpeechUrls {
        if voicerss_reachable {
            SpeechUrls {
                audio_url: self.voicerss.into(),
                fallback_url: self.fallback.into(),
                provider: Provider::VoiceRss,
            }
        } else {
            SpeechUrls {
                audio_url: self.fallback.into(),
                fallback_url: self.voicerss.into(),
                provider: Provider::FreeTtsApi,
            }
        }
    }
}

fn parse_with(base: &str, params: &[(&str, &str)]) -> Result<Url, BrokerError> {
    Url::parse_with_params(base, params).map_err(|e| BrokerError::InvalidUrl {
        url: base.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> BrokerConfig {
        BrokerConfig {
            voicerss_api_key: "k3y".into(),
            ..BrokerConfig::default()
        }
    }

    #[test]
    fn voicerss_url_carries_key_language_voice_and_text() {
        let urls = ProviderUrls::build(&config(), "Hello world", "female").unwrap();
        assert_eq!(
            urls.voicerss.as_str(),
            "https://api.voicerss.org/?key=k3y&hl=en-us&v=Mary&src=Hello+world"
        );
    }

    #[test]
    fn fallback_url_carries_text_and_voice() {
        let urls = ProviderUrls::build(&config(), "Hello world", "male").unwrap();
        assert_eq!(
            urls.fallback.as_str(),
            "https://tiktok-tts.weilnet.workers.dev/api/generation?text=Hello+world&voice=en_us_001"
        );
    }

    #[test]
    fn voice_mapping() {
        let male = ProviderUrls::build(&config(), "x", "male").unwrap();
        assert!(male.voicerss.as_str().contains("v=John"));
        assert!(male.fallback.as_str().ends_with("voice=en_us_001"));

        let female = ProviderUrls::build(&config(), "x", "female").unwrap();
        assert!(female.voicerss.as_str().contains("v=Mary"));
        assert!(female.fallback.as_str().ends_with("voice=en_us_002"));

        // Anything else: John on VoiceRSS, en_us_002 on the fallback.
        let other = ProviderUrls::build(&config(), "x", "robot").unwrap();
        assert!(other.voicerss.as_str().contains("v=John"));
        assert!(other.fallback.as_str().ends_with("voice=en_us_002"));
    }

    #[test]
    fn text_is_encoded() {
        let urls = ProviderUrls::build(&config(), "a&b=c ไทย?", "male").unwrap();
        let src = urls
            .voicerss
            .query_pairs()
            .find(|(k, _)| k == "src")
            .map(|(_, v)| v.into_owned());
        assert_eq!(src.as_deref(), Some("a&b=c ไทย?"));
        assert!(!urls.voicerss.as_str().contains(' '));
    }

    #[test]
    fn invalid_base_url_is_an_error() {
        let cfg = BrokerConfig {
            voicerss_url: "not a url".into(),
            ..config()
        };
        let err = ProviderUrls::build(&cfg, "x", "male").unwrap_err();
        assert!(matches!(err, BrokerError::InvalidUrl { .. }));
    }

    #[test]
    fn selection_swaps_on_unreachable() {
        let urls = ProviderUrls::build(&config(), "Hi", "male").unwrap();

        let up = urls.clone().select(true);
        assert_eq!(up.provider, Provider::VoiceRss);
        assert_eq!(up.audio_url, urls.voicerss.as_str());
        assert_eq!(up.fallback_url, urls.fallback.as_str());

        let down = urls.clone().select(false);
        assert_eq!(down.provider, Provider::FreeTtsApi);
        assert_eq!(down.audio_url, urls.fallback.as_str());
        assert_eq!(down.fallback_url, urls.voicerss.as_str());
    }

    #[test]
    fn response_uses_camel_case_and_provider_keys() {
        let body = SpeechUrls {
            audio_url: "a".into(),
            fallback_url: "b".into(),
            provider: Provider::FreeTtsApi,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"audioUrl": "a", "fallbackUrl": "b", "provider": "freettsapi"})
        );
    }
}
