use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// Shared secret for `X-Hub-Signature-256` verification; None disables it
    pub secret: Option<String>,
}
