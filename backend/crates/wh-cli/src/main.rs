//! wh - server lifecycle test harness
//!
//! # Examples
//!
//! ```bash
//! # Start the configured server, check /health, shut it down
//! wh test
//!
//! # Point the harness at another command and port
//! wh test --command "npm start" --port 4000 --attempts 5
//!
//! # Run the steps of pipeline.yaml in order
//! wh pipeline --file pipeline.yaml
//! ```

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use log::error;
use wh_cli::{Cli, Commands, Pipeline};
use wh_config::{Config, LogLevel, logger};
use wh_harness::{Orchestrator, ShutdownCoordinator, signals};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Commands::Test(ref args) = cli.command {
        args.apply(&mut config);
    }
    if let Some(ref level) = cli.log_level {
        let Ok(level) = level.parse::<LogLevel>();
        config.logging.level = level;
    }

    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {e}");
        return ExitCode::FAILURE;
    }

    let log_file = match config.log_file_path() {
        Ok(path) => path,
        Err(e) => {
            eprintln!("Error resolving log file: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = logger::initialize(config.logging.level, log_file, config.logging.colored) {
        eprintln!("Error initializing logger: {e}");
        return ExitCode::FAILURE;
    }

    match cli.command {
        Commands::Test(_) => run_test(&config).await,
        Commands::Pipeline { ref file } => run_pipeline(file).await,
    }
}

async fn run_test(config: &Config) -> ExitCode {
    config.log_summary();

    let coordinator = ShutdownCoordinator::new();
    signals::install(&coordinator);

    let report = Orchestrator::from_config(config, coordinator).run().await;
    for failure in &report.failures {
        eprintln!("{failure}");
    }
    ExitCode::from(report.exit_code())
}

async fn run_pipeline(file: &Path) -> ExitCode {
    let pipeline = match Pipeline::load(file) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    match pipeline.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Pipeline failed: {e}");
            ExitCode::FAILURE
        }
    }
}
