// ABOUTME: Advanced execution orchestrator running untrusted code in ephemeral sandboxes
// ABOUTME: Pipeline: install dependencies, snapshot, run code, snapshot, recover artifacts

pub mod artifacts;
pub mod error;
pub mod install;
pub mod orchestrator;
pub mod runner;
pub mod snapshot;
pub mod types;

pub use error::{ExecutorError, Result};
pub use orchestrator::{ExecutorConfig, Orchestrator};
pub use types::{ExecuteRequest, ExecuteResponse, FileResult, InputFile, PlotResult};
