use crate::commands::Commands;

use clap::Parser;

#[derive(Parser)]
#[command(name = "wh")]
#[command(about = "Server lifecycle test harness and pipeline runner")]
#[command(version)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error); overrides configuration
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}
