//! wh-cli library
//!
//! Exposes the command line definition, the pipeline runner and the `test`
//! flag overrides for use in tests and by the `wh` binary.

mod cli;
mod commands;
mod error;
pub mod pipeline;


pub use cli::Cli;
pub use commands::{Commands, TestArgs};
pub use error::{PipelineError, Result as PipelineResult};
pub use pipeline::{Pipeline, PipelineStep};
