// ABOUTME: Provider trait and outcome types for sandbox execution backends
// ABOUTME: Defines the abstract interface for sandbox lifecycle, code execution, and file access

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::credentials::ApiKey;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Sandbox creation rejected: {0}")]
    CreationRejected(String),

    #[error("Sandbox not found: {0}")]
    SandboxNotFound(String),

    #[error("Command error: {0}")]
    CommandError(String),

    #[error("File error for {path}: {reason}")]
    FileError { path: String, reason: String },

    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Internal error: {0}")]
    InternalError(String),
}

pub type Result<T> = std::result::Result<T, ProviderError>;

/// Opaque reference to one isolated execution environment.
///
/// A handle is owned by exactly one request pipeline and released exactly
/// once; it is never shared across requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxHandle {
    pub id: String,
}

impl SandboxHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// A value produced by the final evaluated expression of a code submission,
/// analogous to an interactive notebook's trailing output cell.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultValue {
    /// Rendered image, data already base64-encoded by the provider
    Image { format: String, data: String },
    /// Plain-text representation of the value
    Text(String),
    /// Any other representation; ignored by the runner
    Other,
}

/// Outcome of one code submission inside a sandbox.
#[derive(Debug, Clone, Default)]
pub struct Execution {
    /// Stdout log fragments, in emission order
    pub stdout: Vec<String>,
    /// Stderr log fragments, in emission order
    pub stderr: Vec<String>,
    /// Execution-level error (the code raised/failed); distinct from a
    /// transport failure, which surfaces as a `ProviderError` instead
    pub error: Option<String>,
    /// Result values in production order
    pub results: Vec<ResultValue>,
}

/// Output of a shell command run inside a sandbox.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i64,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// File content as returned by the provider, which may deliver either raw
/// bytes or decoded text depending on the file.
#[derive(Debug, Clone)]
pub enum FileContent {
    Bytes(Vec<u8>),
    Text(String),
}

impl FileContent {
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            FileContent::Bytes(b) => b,
            FileContent::Text(t) => t.into_bytes(),
        }
    }
}

/// Capability surface of an external sandbox provider.
///
/// Implementations wrap a concrete isolation backend (cloud sandbox API,
/// local container runtime). The orchestrator treats this as opaque: it
/// never assumes anything about the isolation mechanism beyond this trait.
#[async_trait]
pub trait SandboxProvider: Send + Sync {
    /// Create one ephemeral sandbox authenticated with the given key
    async fn create_sandbox(&self, api_key: &ApiKey) -> Result<SandboxHandle>;

    /// Release a sandbox. Must be idempotent; releasing an already-closed
    /// sandbox is not an error.
    async fn close_sandbox(&self, handle: &SandboxHandle) -> Result<()>;

    /// Submit code for synchronous evaluation, blocking until completion or
    /// the timeout. A failure of the code itself is reported inside the
    /// returned `Execution`; an `Err` means the call itself failed.
    async fn run_code(
        &self,
        handle: &SandboxHandle,
        code: &str,
        timeout: Duration,
    ) -> Result<Execution>;

    /// Run a shell command inside the sandbox, bounded by the timeout
    async fn run_command(
        &self,
        handle: &SandboxHandle,
        command: &str,
        timeout: Duration,
    ) -> Result<CommandOutput>;

    /// Read a file from the sandbox filesystem
    async fn read_file(&self, handle: &SandboxHandle, path: &str) -> Result<FileContent>;

    /// Write a file into the sandbox filesystem
    async fn write_file(&self, handle: &SandboxHandle, path: &str, data: &[u8]) -> Result<()>;
}
