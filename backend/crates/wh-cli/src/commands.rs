use std::path::PathBuf;

use clap::{Args, Subcommand};
use wh_config::Config;

#[derive(Subcommand)]
pub enum Commands {
    /// Start the server, check its health endpoint and shut it down again
    Test(TestArgs),

    /// Run the shell steps of a YAML pipeline in order
    Pipeline {
        /// Pipeline definition
        #[arg(long, short, default_value = "pipeline.yaml")]
        file: PathBuf,
    },
}

/// Flags of `wh test`; each one overrides the loaded configuration.
#[derive(Args, Debug, Clone, Default)]
pub struct TestArgs {
    /// Base URL the health endpoint is probed on
    #[arg(long)]
    pub server_url: Option<String>,

    /// Port the server listens on
    #[arg(long)]
    pub port: Option<u16>,

    /// Shell command that starts the server
    #[arg(long)]
    pub command: Option<String>,

    /// Text the server prints once it is listening
    #[arg(long)]
    pub marker: Option<String>,

    /// Maximum number of launch attempts
    #[arg(long)]
    pub attempts: Option<u32>,
}

impl TestArgs {
    pub fn apply(&self, config: &mut Config) {
        if let Some(ref url) = self.server_url {
            config.server.base_url = Some(url.clone());
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(ref command) = self.command {
            config.harness.start_command = command.clone();
        }
        if let Some(ref marker) = self.marker {
            config.harness.readiness_marker = marker.clone();
        }
        if let Some(attempts) = self.attempts {
            config.retry.max_attempts = attempts;
        }
    }
}
