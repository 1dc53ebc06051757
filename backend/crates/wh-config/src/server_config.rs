use crate::{
    ConfigError, ConfigErrorResult, DEFAULT_ENVIRONMENT, DEFAULT_HEALTH_PATH, DEFAULT_HOST,
    DEFAULT_PORT,
};

use serde::Deserialize;

/// Where the target server listens and how it is probed.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Path of the health endpoint, starting with `/`
    pub health_path: String,
    /// Overrides the URL used for HTTP probing (defaults to `http://{host}:{port}`)
    pub base_url: Option<String>,
    /// Reported by the server's health endpoint
    pub environment: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: String::from(DEFAULT_HOST),
            port: DEFAULT_PORT,
            health_path: String::from(DEFAULT_HEALTH_PATH),
            base_url: None,
            environment: String::from(DEFAULT_ENVIRONMENT),
        }
    }
}

impl ServerConfig {
    /// Base URL used for HTTP requests, without a trailing slash.
    pub fn base_url(&self) -> String {
        match &self.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("http://{}:{}", self.host, self.port),
        }
    }

    /// Full URL of the health endpoint.
    pub fn health_url(&self) -> String {
        format!("{}{}", self.base_url(), self.health_path)
    }

    /// `host:port` string for binding.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.port == 0 {
            return Err(ConfigError::server("server.port must be non-zero"));
        }

        if self.host.trim().is_empty() {
            return Err(ConfigError::server("server.host must not be empty"));
        }

        if !self.health_path.starts_with('/') {
            return Err(ConfigError::server(format!(
                "server.health_path must start with '/', got '{}'",
                self.health_path
            )));
        }

        // The probe client is built without TLS
        if let Some(ref url) = self.base_url
            && !url.starts_with("http://")
        {
            return Err(ConfigError::server(format!(
                "server.base_url must be an http:// URL, got '{url}'"
            )));
        }

        Ok(())
    }
}
