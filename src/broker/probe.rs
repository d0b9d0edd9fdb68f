//! Reachability probe for the primary provider.
//!
//! One `HEAD` request with a short timeout.  No retries and no caching; a
//! slow or failing provider simply loses its primary slot for this request.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use thiserror::Error;

use super::error::BrokerError;

/// Why a probe failed.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Connection or transport failure.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// No response within the probe timeout.
    #[error("probe timed out")]
    Timeout,

    /// The provider answered with a non-success status.
    #[error("provider returned HTTP {0}")]
    Status(u16),
}

impl From<reqwest::Error> for ProbeError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ProbeError::Timeout
        } else {
            ProbeError::Request(e.to_string())
        }
    }
}

/// Checks whether a provider URL is currently usable.
#[async_trait]
pub trait ReachabilityProbe: Send + Sync {
    async fn probe(&self, url: &Url) -> Result<(), ProbeError>;
}

/// Probes with an HTTP `HEAD`; any 2xx counts as reachable.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: reqwest::Client,
}

impl HttpProbe {
    pub fn new(timeout: Duration) -> Result<Self, BrokerError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ReachabilityProbe for HttpProbe {
    async fn probe(&self, url: &Url) -> Result<(), ProbeError> {
        let response = self.client.head(url.clone()).send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ProbeError::Status(status.as_u16()))
        }
    }
}
