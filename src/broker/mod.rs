//! TTS URL broker.
//!
//! A stateless HTTP service that hands the browser-side avatar two
//! third-party TTS URLs for a text: a primary and a fallback.  The primary
//! slot goes to VoiceRSS when a quick `HEAD` probe succeeds, otherwise to the
//! keyless fallback provider.  Audio bytes are never fetched or proxied.
//!
//! * [`router`]: axum routes (`GET /`, `POST /generate-speech`) with CORS.
//! * [`serve`]: bind and run with an [`HttpProbe`].
//! * [`ProviderUrls`]: URL construction and primary/fallback selection.
//! * [`ReachabilityProbe`]: async seam over the liveness check.

pub mod error;
pub mod probe;
pub mod providers;
pub mod server;

pub use error::{BrokerError, GENERATION_FAILED, MISSING_FIELDS};
pub use probe::{HttpProbe, ProbeError, ReachabilityProbe};
pub use providers::{Provider, ProviderUrls, SpeechUrls};
pub use server::{router, serve, BrokerState, GenerateSpeechRequest, BANNER};
