use wh_config::ServerConfig;

/// Where the target server is expected to listen.
///
/// `port` is what the port waiter watches; `base_url` is what the health
/// prober talks to. They normally describe the same socket, but the base
/// URL can be pointed elsewhere (a proxy, `localhost` vs `127.0.0.1`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerEndpoint {
    pub host: String,
    pub port: u16,
    pub health_path: String,
    pub base_url: String,
}

impl ServerEndpoint {
    pub fn new(host: impl Into<String>, port: u16, health_path: impl Into<String>) -> Self {
        let host = host.into();
        let base_url = format!("http://{host}:{port}");
        Self {
            host,
            port,
            health_path: health_path.into(),
            base_url,
        }
    }

    pub fn from_config(server: &ServerConfig) -> Self {
        Self {
            host: server.host.clone(),
            port: server.port,
            health_path: server.health_path.clone(),
            base_url: server.base_url(),
        }
    }

    /// Point HTTP probing at a different base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn health_url(&self) -> String {
        format!("{}{}", self.base_url, self.health_path)
    }
}
