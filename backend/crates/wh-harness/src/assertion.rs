use crate::{HarnessError, HarnessResult, HealthProber, ProbeResult, ServerEndpoint};

use async_trait::async_trait;
use log::info;

/// Check run against the server once it is ready.
#[async_trait]
pub trait Assertion: Send + Sync {
    fn name(&self) -> &str;

    async fn verify(&self, endpoint: &ServerEndpoint, prober: &HealthProber) -> HarnessResult<()>;
}

/// Passes when the health endpoint answers 2xx.
#[derive(Debug, Clone, Default)]
pub struct HealthAssertion;

#[async_trait]
impl Assertion for HealthAssertion {
    fn name(&self) -> &str {
        "health"
    }

    async fn verify(&self, endpoint: &ServerEndpoint, prober: &HealthProber) -> HarnessResult<()> {
        let url = endpoint.health_url();
        match prober.check().await {
            ProbeResult::Healthy { status, body, .. } => {
                info!("Server responded: GET {url} => {status}");
                if let Some(body) = body {
                    info!(
                        "Server status '{}' in '{}', up {:.1}s",
                        body.status, body.environment, body.uptime
                    );
                }
                Ok(())
            }
            ProbeResult::Unhealthy { status, .. } => Err(HarnessError::health_check(format!(
                "GET {url} returned status {status}"
            ))),
            ProbeResult::Unreachable { error } => Err(HarnessError::health_check(format!(
                "GET {url} failed: {error}"
            ))),
        }
    }
}
