// ABOUTME: Error types for the execution orchestrator
// ABOUTME: Separates pre-flight configuration/provisioning failures from provider faults

use runbox_sandbox::ProviderError;
use thiserror::Error;

/// Errors the orchestrator surfaces to its caller.
///
/// These are the fatal/pre-flight class: the caller maps them to transport
/// failures. Dependency-install failures and execution-level errors are not
/// errors here; they are delivered as a normal response with `success: false`.
#[derive(Error, Debug)]
pub enum ExecutorError {
    /// No API key was available for the request
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The provider rejected sandbox creation (bad credential, quota, network)
    #[error("Failed to provision sandbox: {0}")]
    Provisioning(String),

    /// Unexpected provider fault during the pipeline
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}

pub type Result<T> = std::result::Result<T, ExecutorError>;
