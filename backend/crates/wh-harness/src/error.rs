use std::panic::Location;

use error_location::ErrorLocation;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("Failed to spawn server process '{command}': {message} {location}")]
    SpawnError {
        command: String,
        message: String,
        location: ErrorLocation,
    },

    #[error("Server failed to become ready within {timeout_ms}ms {location}")]
    StartupTimeout {
        timeout_ms: u64,
        location: ErrorLocation,
    },

    #[error("Server exited before becoming ready (exit code {code:?}) {location}")]
    EarlyExit {
        code: Option<i32>,
        location: ErrorLocation,
    },

    #[error("Health check failed: {message} {location}")]
    HealthCheckFailure {
        message: String,
        location: ErrorLocation,
    },

    #[error("Server did not exit within {timeout_ms}ms, even after forceful kill {location}")]
    ShutdownTimeout {
        timeout_ms: u64,
        location: ErrorLocation,
    },

    #[error("Port {host}:{port} still bound after {timeout_ms}ms {location}")]
    PortStillBound {
        host: String,
        port: u16,
        timeout_ms: u64,
        location: ErrorLocation,
    },

    #[error("Interrupted by shutdown signal {location}")]
    Interrupted { location: ErrorLocation },

    #[error("HTTP client error: {source} {location}")]
    Http {
        #[source]
        source: reqwest::Error,
        location: ErrorLocation,
    },
}

impl HarnessError {
    /// Whether a fresh launch attempt may fix this error.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::SpawnError { .. } | Self::StartupTimeout { .. } | Self::EarlyExit { .. }
        )
    }

    /// Short machine-friendly name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SpawnError { .. } => "SpawnError",
            Self::StartupTimeout { .. } => "StartupTimeout",
            Self::EarlyExit { .. } => "EarlyExit",
            Self::HealthCheckFailure { .. } => "HealthCheckFailure",
            Self::ShutdownTimeout { .. } => "ShutdownTimeout",
            Self::PortStillBound { .. } => "PortStillBound",
            Self::Interrupted { .. } => "Interrupted",
            Self::Http { .. } => "Http",
        }
    }

    #[track_caller]
    pub fn health_check<S: Into<String>>(message: S) -> Self {
        Self::HealthCheckFailure {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn interrupted() -> Self {
        Self::Interrupted {
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<reqwest::Error> for HarnessError {
    #[track_caller]
    fn from(source: reqwest::Error) -> Self {
        Self::Http {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

pub type Result<T> = std::result::Result<T, HarnessError>;
