mod config;
mod error;
mod harness_config;
mod log_level;
pub mod logger;
mod logging_config;
mod retry_config;
mod server_config;
mod webhook_config;

#[cfg(test)]
mod tests;

pub use config::Config;
pub use error::{ConfigError, ConfigErrorResult};
pub use harness_config::HarnessConfig;
pub use log_level::LogLevel;
pub use logging_config::LoggingConfig;
pub use retry_config::RetryConfig;
pub use server_config::ServerConfig;
pub use webhook_config::WebhookConfig;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 4000;
const DEFAULT_HEALTH_PATH: &str = "/health";
const DEFAULT_ENVIRONMENT: &str = "development";
const DEFAULT_START_COMMAND: &str = "wh-server";
const DEFAULT_READINESS_MARKER: &str = "Server running";
const DEFAULT_LOG_LEVEL_STRING: &str = "info";
const DEFAULT_LOG_LEVEL: log::LevelFilter = log::LevelFilter::Info;
const DEFAULT_LOG_DIRECTORY: &str = "log";
const DEFAULT_CONFIG_DIRECTORY: &str = ".wh";
const CONFIG_FILENAME: &str = "config.toml";
