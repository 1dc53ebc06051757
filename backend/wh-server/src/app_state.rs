use wh_config::Config;

use std::sync::Arc;
use std::time::Instant;

/// Shared state for all handlers.
#[derive(Clone)]
pub struct AppState {
    pub started_at: Instant,
    pub environment: String,
    pub webhook_secret: Option<Arc<str>>,
}

impl AppState {
    pub fn new(environment: impl Into<String>, webhook_secret: Option<String>) -> Self {
        Self {
            started_at: Instant::now(),
            environment: environment.into(),
            webhook_secret: webhook_secret.map(Arc::from),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.server.environment.clone(),
            config.webhook.secret.clone(),
        )
    }

    /// Seconds since the server started.
    pub fn uptime(&self) -> f64 {
        self.started_at.elapsed().as_secs_f64()
    }
}
