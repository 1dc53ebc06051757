use crate::{
    CONFIG_FILENAME, ConfigError, ConfigErrorResult, DEFAULT_CONFIG_DIRECTORY, HarnessConfig,
    LoggingConfig, RetryConfig, ServerConfig, WebhookConfig,
};

use std::path::{Path, PathBuf};

use log::info;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub harness: HarnessConfig,
    pub retry: RetryConfig,
    pub logging: LoggingConfig,
    pub webhook: WebhookConfig,
}

impl Config {
    /// Load config with full production error handling.
    ///
    /// Loading order:
    /// 1. Load `.env` from the working directory, if present
    /// 2. Check for WH_CONFIG_DIR env var, else use ./.wh/
    /// 3. Auto-create config directory if it doesn't exist
    /// 4. Load config.toml if it exists, else use defaults
    /// 5. Apply conventional env vars (PORT, SERVER_URL, ...), then WH_* overrides
    ///
    /// Does NOT validate - call validate() after load().
    pub fn load() -> ConfigErrorResult<Self> {
        dotenvy::dotenv().ok();

        let config_dir = Self::config_dir()?;

        if !config_dir.exists() {
            std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::Io {
                path: config_dir.clone(),
                source: e,
            })?;
        }

        let config_path = config_dir.join(CONFIG_FILENAME);

        let mut config = if config_path.exists() {
            Self::load_toml(&config_path)?
        } else {
            Config::default()
        };

        config.apply_conventional_env();
        config.apply_env_overrides();

        Ok(config)
    }

    /// Load and parse TOML file with detailed error context.
    fn load_toml(path: &Path) -> ConfigErrorResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::Toml {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the config directory.
    /// Priority: WH_CONFIG_DIR env var > ./.wh/ (relative to cwd)
    pub fn config_dir() -> ConfigErrorResult<PathBuf> {
        if let Ok(dir) = std::env::var("WH_CONFIG_DIR") {
            return Ok(PathBuf::from(dir));
        }

        let cwd = std::env::current_dir()
            .map_err(|_| ConfigError::config("Cannot determine current working directory"))?;
        Ok(cwd.join(DEFAULT_CONFIG_DIRECTORY))
    }

    /// Validate all configuration.
    /// Call after load() to catch all errors at startup.
    pub fn validate(&self) -> ConfigErrorResult<()> {
        self.server.validate()?;
        self.harness.validate()?;
        self.retry.validate()?;

        if let Some(ref file) = self.logging.file
            && (Path::new(file).is_absolute() || file.contains(".."))
        {
            return Err(ConfigError::logging(
                "logging.file must be relative and cannot contain '..'",
            ));
        }

        Ok(())
    }

    /// Absolute path of the log file, if file logging is configured.
    pub fn log_file_path(&self) -> ConfigErrorResult<Option<PathBuf>> {
        match self.logging.file {
            Some(ref filename) => {
                let log_dir = Self::config_dir()?.join(&self.logging.dir);
                Ok(Some(log_dir.join(filename)))
            }
            None => Ok(None),
        }
    }

    /// Log configuration summary (NEVER logs secrets).
    pub fn log_summary(&self) {
        info!("Configuration loaded:");
        info!(
            "  server: {} (health: {}, env: {})",
            self.server.bind_addr(),
            self.server.health_url(),
            self.server.environment
        );
        info!(
            "  harness: command='{}', marker='{}'",
            self.harness.start_command, self.harness.readiness_marker
        );
        info!(
            "  timeouts: startup={}ms, probe={}ms/{}ms, grace={}ms, shutdown={}ms, port={}ms/{}ms",
            self.harness.startup_timeout_ms,
            self.harness.probe_timeout_ms,
            self.harness.probe_interval_ms,
            self.harness.grace_period_ms,
            self.harness.shutdown_timeout_ms,
            self.harness.port_poll_interval_ms,
            self.harness.port_free_timeout_ms
        );
        info!(
            "  retry: attempts={}, initial={}ms, max={}ms, backoff={}x",
            self.retry.max_attempts,
            self.retry.initial_delay_ms,
            self.retry.max_delay_ms,
            self.retry.backoff_multiplier
        );
        info!(
            "  logging: {} (colored: {})",
            self.logging.level, self.logging.colored
        );
        info!(
            "  webhook: signature verification {}",
            if self.webhook.secret.is_some() {
                "enabled"
            } else {
                "disabled"
            }
        );
    }

    /// Names used by the scripts this tool replaces. Lower priority than WH_*.
    fn apply_conventional_env(&mut self) {
        Self::apply_env_parse("PORT", &mut self.server.port);
        Self::apply_env_option_string("SERVER_URL", &mut self.server.base_url);
        Self::apply_env_string("NODE_ENV", &mut self.server.environment);
        Self::apply_env_option_string("GITHUB_WEBHOOK_SECRET", &mut self.webhook.secret);
    }

    fn apply_env_overrides(&mut self) {
        // Server
        Self::apply_env_string("WH_SERVER_HOST", &mut self.server.host);
        Self::apply_env_parse("WH_SERVER_PORT", &mut self.server.port);
        Self::apply_env_option_string("WH_SERVER_URL", &mut self.server.base_url);
        Self::apply_env_string("WH_HEALTH_PATH", &mut self.server.health_path);
        Self::apply_env_string("WH_ENVIRONMENT", &mut self.server.environment);

        // Harness
        Self::apply_env_string("WH_START_COMMAND", &mut self.harness.start_command);
        Self::apply_env_string("WH_READINESS_MARKER", &mut self.harness.readiness_marker);
        Self::apply_env_parse(
            "WH_STARTUP_TIMEOUT_MS",
            &mut self.harness.startup_timeout_ms,
        );
        Self::apply_env_parse("WH_PROBE_TIMEOUT_MS", &mut self.harness.probe_timeout_ms);
        Self::apply_env_parse("WH_PROBE_INTERVAL_MS", &mut self.harness.probe_interval_ms);
        Self::apply_env_parse("WH_GRACE_PERIOD_MS", &mut self.harness.grace_period_ms);
        Self::apply_env_parse(
            "WH_SHUTDOWN_TIMEOUT_MS",
            &mut self.harness.shutdown_timeout_ms,
        );
        Self::apply_env_parse(
            "WH_PORT_POLL_INTERVAL_MS",
            &mut self.harness.port_poll_interval_ms,
        );
        Self::apply_env_parse(
            "WH_PORT_FREE_TIMEOUT_MS",
            &mut self.harness.port_free_timeout_ms,
        );

        // Retry
        Self::apply_env_parse("WH_RETRY_MAX_ATTEMPTS", &mut self.retry.max_attempts);
        Self::apply_env_parse(
            "WH_RETRY_INITIAL_DELAY_MS",
            &mut self.retry.initial_delay_ms,
        );
        Self::apply_env_parse("WH_RETRY_MAX_DELAY_MS", &mut self.retry.max_delay_ms);
        Self::apply_env_parse(
            "WH_RETRY_BACKOFF_MULTIPLIER",
            &mut self.retry.backoff_multiplier,
        );

        // Logging
        Self::apply_env_parse("WH_LOG_LEVEL", &mut self.logging.level);
        Self::apply_env_bool("WH_LOG_COLORED", &mut self.logging.colored);
        Self::apply_env_option_string("WH_LOG_FILE", &mut self.logging.file);

        // Webhook
        Self::apply_env_option_string("WH_WEBHOOK_SECRET", &mut self.webhook.secret);
    }

    /// Helper: Apply environment variable override for String values
    fn apply_env_string(var_name: &str, target: &mut String) {
        if let Ok(val) = std::env::var(var_name) {
            *target = val;
        }
    }

    /// Helper: Apply environment variable override for bool values (accepts "true"/"1")
    fn apply_env_bool(var_name: &str, target: &mut bool) {
        if let Ok(val) = std::env::var(var_name) {
            *target = val == "true" || val == "1";
        }
    }

    /// Helper: Apply environment variable override for parseable values
    fn apply_env_parse<T: std::str::FromStr>(var_name: &str, target: &mut T) {
        if let Ok(val) = std::env::var(var_name)
            && let Ok(parsed) = val.parse()
        {
            *target = parsed;
        }
    }

    /// Helper: Apply environment variable override for Option<String> values
    fn apply_env_option_string(var_name: &str, target: &mut Option<String>) {
        if let Ok(val) = std::env::var(var_name)
            && !val.is_empty()
        {
            *target = Some(val);
        }
    }
}
