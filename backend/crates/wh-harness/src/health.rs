//! Health probing of the target server.

use crate::HarnessResult;

use std::time::{Duration, Instant};

use log::debug;

/// Result of a single request to the health endpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeResult {
    /// Endpoint answered with a 2xx status
    Healthy {
        status: u16,
        latency_ms: u64,
        body: Option<HealthResponse>,
    },
    /// Endpoint answered with any other status
    Unhealthy { status: u16, latency_ms: u64 },
    /// No response: refused, reset or timed out
    Unreachable { error: String },
}

impl ProbeResult {
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy { .. })
    }

    /// HTTP status, if any response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Healthy { status, .. } | Self::Unhealthy { status, .. } => Some(*status),
            Self::Unreachable { .. } => None,
        }
    }
}

/// Body of the `/health` endpoint.
///
/// Only used for diagnostics: a 2xx answer is healthy even when the body
/// does not decode.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub uptime: f64,
    pub environment: String,
}

/// Issues bounded-timeout GET requests to a health URL.
///
/// Any 2xx status counts as healthy. Every failure mode (refused
/// connection, timeout, non-2xx status) is reported as a value, never as
/// an error, so callers can poll without error plumbing.
#[derive(Debug, Clone)]
pub struct HealthProber {
    client: reqwest::Client,
    url: String,
}

impl HealthProber {
    /// Create a prober for `url` where each request is cut off after `timeout`.
    pub fn new(url: impl Into<String>, timeout: Duration) -> HarnessResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(1)
            .build()?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Perform a single health check and classify the answer.
    pub async fn check(&self) -> ProbeResult {
        let start = Instant::now();
        let result = self.client.get(&self.url).send().await;
        let latency_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(resp) if resp.status().is_success() => {
                let status = resp.status().as_u16();
                let body = match resp.json::<HealthResponse>().await {
                    Ok(body) => Some(body),
                    Err(e) => {
                        debug!("Health body from {} did not decode: {e}", self.url);
                        None
                    }
                };
                ProbeResult::Healthy {
                    status,
                    latency_ms,
                    body,
                }
            }
            Ok(resp) => ProbeResult::Unhealthy {
                status: resp.status().as_u16(),
                latency_ms,
            },
            Err(e) => ProbeResult::Unreachable {
                error: e.to_string(),
            },
        }
    }

    /// `true` only for a 2xx answer within the timeout.
    pub async fn probe(&self) -> bool {
        let result = self.check().await;
        if !result.is_healthy() {
            debug!("Health probe {} => {result:?}", self.url);
        }
        result.is_healthy()
    }
}
