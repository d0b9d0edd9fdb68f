//! Broker errors and their HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Body message for requests without usable `text` / `voice`.
pub const MISSING_FIELDS: &str = "Text and voice are required.";

/// Body message for every internal failure.
pub const GENERATION_FAILED: &str = "Speech generation failed";

/// Errors raised while brokering provider URLs.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// `text` or `voice` is missing or empty, or the body is not JSON.
    #[error("Text and voice are required.")]
    MissingFields,

    /// A configured provider base URL could not be parsed.
    #[error("invalid provider URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    Client(String),
}

impl From<reqwest::Error> for BrokerError {
    fn from(e: reqwest::Error) -> Self {
        BrokerError::Client(e.to_string())
    }
}

impl BrokerError {
    pub fn status(&self) -> StatusCode {
        match self {
            BrokerError::MissingFields => StatusCode::BAD_REQUEST,
            BrokerError::InvalidUrl { .. } | BrokerError::Client(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for BrokerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status == StatusCode::BAD_REQUEST {
            MISSING_FIELDS
        } else {
            log::error!("broker: {self}");
            GENERATION_FAILED
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
