//! Sequential shell-step runner driven by a YAML file.
//!
//! ```yaml
//! steps:
//!   - name: Build
//!     command: cargo build
//!   - name: Test
//!     command: wh test
//! ```

use crate::{PipelineError, PipelineResult};

use std::path::Path;
use std::process::Stdio;

use log::{error, info};
use serde::Deserialize;
use wh_harness::LaunchCommand;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PipelineStep {
    pub name: String,
    pub command: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct Pipeline {
    #[serde(default)]
    pub steps: Vec<PipelineStep>,
}

impl Pipeline {
    pub fn load(path: &Path) -> PipelineResult<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| PipelineError::read(path, e))?;
        Self::parse(&contents).map_err(|e| PipelineError::parse(path, e))
    }

    /// An empty document is an empty pipeline.
    pub fn parse(contents: &str) -> Result<Self, serde_yaml::Error> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(contents)
    }

    /// Run every step through the shell with inherited stdio, stopping at
    /// the first one that cannot start or exits non-zero.
    pub async fn run(&self) -> PipelineResult<()> {
        for step in &self.steps {
            info!("Running step: {}", step.name);

            // Stays in the caller's process group so Ctrl+C reaches the step
            let shell = LaunchCommand::shell(step.command.clone());
            let status = tokio::process::Command::new(shell.program())
                .args(shell.arguments())
                .stdin(Stdio::inherit())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit())
                .status()
                .await
                .map_err(|e| PipelineError::spawn(&step.name, e))?;

            if !status.success() {
                error!("Step '{}' failed ({status})", step.name);
                return Err(PipelineError::step_failed(&step.name, status.code()));
            }
        }

        info!("All steps completed");
        Ok(())
    }
}
