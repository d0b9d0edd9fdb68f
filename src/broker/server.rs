//! HTTP surface of the broker.
//!
//! ```text
//! GET  /                 → "Avatar-Driven TTS App Backend"
//! POST /generate-speech  {text, voice}
//!        ├─ missing / empty / not JSON → 400 {"error": "Text and voice are required."}
//!        ├─ build VoiceRSS + fallback URLs
//!        ├─ HEAD VoiceRSS (timeout) ─ ok  → {audioUrl: voicerss, fallbackUrl, provider: "voicerss"}
//!        │                          └ err → {audioUrl: fallback, fallbackUrl, provider: "freettsapi"}
//!        └─ internal failure            → 500 {"error": "Speech generation failed"}
//! ```

use std::sync::Arc;

use anyhow::Context;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};

use crate::config::BrokerConfig;

use super::error::BrokerError;
use super::probe::{HttpProbe, ReachabilityProbe};
use super::providers::{ProviderUrls, SpeechUrls};

/// Plain-text banner served at `/`.
pub const BANNER: &str = "Avatar-Driven TTS App Backend";

/// Body of `POST /generate-speech`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GenerateSpeechRequest {
    pub text: Option<String>,
    pub voice: Option<String>,
}

/// Shared handler state.
#[derive(Clone)]
pub struct BrokerState {
    config: Arc<BrokerConfig>,
    probe: Arc<dyn ReachabilityProbe>,
}

impl BrokerState {
    pub fn new(config: BrokerConfig, probe: Arc<dyn ReachabilityProbe>) -> Self {
        Self {
            config: Arc::new(config),
            probe,
        }
    }
}

/// Build the broker's router with permissive CORS.
pub fn router(state: BrokerState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/generate-speech", post(generate_speech))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Bind `config.host:config.port` and serve until Ctrl-C.
pub async fn serve(config: BrokerConfig) -> anyhow::Result<()> {
    let probe = HttpProbe::new(config.probe_timeout())?;
    let addr = config.bind_addr();
    let app = router(BrokerState::new(config, Arc::new(probe)));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    log::info!("broker: listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    log::info!("broker: stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::warn!("broker: cannot listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}

async fn root() -> &'static str {
    BANNER
}

async fn generate_speech(
    State(state): State<BrokerState>,
    body: Result<Json<GenerateSpeechRequest>, JsonRejection>,
) -> Result<Json<SpeechUrls>, BrokerError> {
    let Json(request) = body.map_err(|rejection| {
        log::debug!("broker: rejected body: {rejection}");
        BrokerError::MissingFields
    })?;

    let (text, voice) = match (request.text, request.voice) {
        (Some(text), Some(voice)) if !text.is_empty() && !voice.is_empty() => (text, voice),
        _ => return Err(BrokerError::MissingFields),
    };

    let urls = ProviderUrls::build(&state.config, &text, &voice)?;

    let reachable = match state.probe.probe(&urls.voicerss).await {
        Ok(()) => {
            log::info!("broker: VoiceRSS reachable");
            true
        }
        Err(e) => {
            log::info!("broker: VoiceRSS check failed ({e}), using fallback as primary");
            false
        }
    };

    Ok(Json(urls.select(reachable)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use reqwest::Url;
    use tower::ServiceExt;

    use super::*;
    use crate::broker::probe::ProbeError;

    /// Probe with a fixed answer that records what it was asked.
    struct FixedProbe {
        reachable: bool,
        seen: Mutex<Vec<String>>,
    }

    impl FixedProbe {
        fn new(reachable: bool) -> Arc<Self> {
            Arc::new(Self {
                reachable,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ReachabilityProbe for FixedProbe {
        async fn probe(&self, url: &Url) -> Result<(), ProbeError> {
            self.seen.lock().unwrap().push(url.to_string());
            if self.reachable {
                Ok(())
            } else {
                Err(ProbeError::Timeout)
            }
        }
    }

    fn app_with(config: BrokerConfig, probe: Arc<FixedProbe>) -> Router {
        router(BrokerState::new(config, probe))
    }

    fn app(probe: Arc<FixedProbe>) -> Router {
        app_with(BrokerConfig::default(), probe)
    }

    fn post_json(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/generate-speech")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(res: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn root_serves_banner() {
        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        let res = app(FixedProbe::new(true)).oneshot(req).await.unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], BANNER.as_bytes());
    }

    #[tokio::test]
    async fn missing_fields_are_rejected() {
        for body in [
            r#"{"text": "Hello"}"#,
            r#"{"voice": "male"}"#,
            r#"{"text": "", "voice": "male"}"#,
            r#"{"text": "Hello", "voice": ""}"#,
            r#"{}"#,
        ] {
            let probe = FixedProbe::new(true);
            let res = app(probe.clone()).oneshot(post_json(body)).await.unwrap();

            assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{body}");
            let json = json_body(res).await;
            assert_eq!(json["error"], "Text and voice are required.");
            assert!(probe.seen.lock().unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn malformed_json_is_rejected() {
        let res = app(FixedProbe::new(true))
            .oneshot(post_json("{not json"))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(res).await["error"], "Text and voice are required.");
    }

    #[tokio::test]
    async fn reachable_voicerss_is_primary() {
        let probe = FixedProbe::new(true);
        let res = app(probe.clone())
            .oneshot(post_json(r#"{"text": "Hello world", "voice": "female"}"#))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        let json = json_body(res).await;
        assert_eq!(json["provider"], "voicerss");

        let audio = json["audioUrl"].as_str().unwrap();
        let fallback = json["fallbackUrl"].as_str().unwrap();
        assert!(audio.starts_with("https://api.voicerss.org/?key="));
        assert!(audio.contains("v=Mary"));
        assert!(audio.ends_with("src=Hello+world"));
        assert!(fallback.starts_with("https://tiktok-tts.weilnet.workers.dev/api/generation?"));
        assert!(fallback.ends_with("voice=en_us_002"));

        // The probe checked exactly the VoiceRSS URL.
        assert_eq!(*probe.seen.lock().unwrap(), vec![audio.to_string()]);
    }

    #[tokio::test]
    async fn unreachable_voicerss_swaps_urls() {
        let res = app(FixedProbe::new(false))
            .oneshot(post_json(r#"{"text": "Hello world", "voice": "male"}"#))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        let json = json_body(res).await;
        assert_eq!(json["provider"], "freettsapi");
        let audio = json["audioUrl"].as_str().unwrap();
        let fallback = json["fallbackUrl"].as_str().unwrap();
        assert!(audio.contains("tiktok-tts"));
        assert!(audio.ends_with("voice=en_us_001"));
        assert!(fallback.contains("voicerss"));
        assert!(fallback.contains("v=John"));
    }

    #[tokio::test]
    async fn configured_key_is_used() {
        let config = BrokerConfig {
            voicerss_api_key: "abc123".into(),
            ..BrokerConfig::default()
        };
        let res = app_with(config, FixedProbe::new(true))
            .oneshot(post_json(r#"{"text": "Hi", "voice": "male"}"#))
            .await
            .unwrap();
        let json = json_body(res).await;
        assert!(json["audioUrl"].as_str().unwrap().contains("key=abc123&hl=en-us"));
    }

    #[tokio::test]
    async fn bad_provider_config_is_a_server_error() {
        let config = BrokerConfig {
            fallback_url: "::broken::".into(),
            ..BrokerConfig::default()
        };
        let res = app_with(config, FixedProbe::new(true))
            .oneshot(post_json(r#"{"text": "Hi", "voice": "male"}"#))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(res).await["error"], "Speech generation failed");
    }

    #[tokio::test]
    async fn cors_allows_any_origin() {
        let req = Request::builder()
            .uri("/")
            .header(header::ORIGIN, "http://localhost:3000")
            .body(Body::empty())
            .unwrap();
        let res = app(FixedProbe::new(true)).oneshot(req).await.unwrap();

        assert_eq!(
            res.headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .and_then(|v| v.to_str().ok()),
            Some("*")
        );
    }
}
