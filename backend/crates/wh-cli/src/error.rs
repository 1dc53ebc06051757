use std::panic::Location;
use std::path::PathBuf;

use error_location::ErrorLocation;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Failed to read pipeline file {path}: {source} {location}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },

    #[error("Failed to parse pipeline file {path}: {source} {location}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
        location: ErrorLocation,
    },

    #[error("Step '{name}' could not be started: {source} {location}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },

    #[error("Step '{name}' failed with exit code {code:?} {location}")]
    StepFailed {
        name: String,
        code: Option<i32>,
        location: ErrorLocation,
    },
}

impl PipelineError {
    #[track_caller]
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn parse(path: impl Into<PathBuf>, source: serde_yaml::Error) -> Self {
        Self::Parse {
            path: path.into(),
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn spawn(name: impl Into<String>, source: std::io::Error) -> Self {
        Self::Spawn {
            name: name.into(),
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn step_failed(name: impl Into<String>, code: Option<i32>) -> Self {
        Self::StepFailed {
            name: name.into(),
            code,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
