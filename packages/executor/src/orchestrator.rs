// ABOUTME: Orchestration pipeline: acquire sandbox, install, run, diff snapshots, collect
// ABOUTME: Guarantees sandbox release on every exit path and aggregates the terminal response

use crate::artifacts;
use crate::error::{ExecutorError, Result};
use crate::install;
use crate::runner::{self, RunOutcome};
use crate::snapshot::Snapshot;
use crate::types::{ExecuteRequest, ExecuteResponse, FileResult, InputFile};
use runbox_sandbox::{ApiKey, SandboxHandle, SandboxProvider};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Working directory of the sandbox user; snapshots and reconstructed
/// artifact paths are rooted here.
const DEFAULT_HOME_DIR: &str = "/home/user";

/// Installation is typically slower than short scripts, so it gets a more
/// generous fixed budget than the default execution timeout.
const DEFAULT_INSTALL_TIMEOUT: Duration = Duration::from_secs(60);

const DEFAULT_LIST_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Tunables for the orchestrator.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Process-wide default API key; a per-request key overrides it
    pub default_api_key: Option<ApiKey>,
    pub home_dir: String,
    pub install_timeout: Duration,
    pub list_timeout: Duration,
    pub read_timeout: Duration,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            default_api_key: None,
            home_dir: DEFAULT_HOME_DIR.to_string(),
            install_timeout: DEFAULT_INSTALL_TIMEOUT,
            list_timeout: DEFAULT_LIST_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }
}

impl ExecutorConfig {
    /// Default config with the process-wide API key taken from `RUNBOX_API_KEY`.
    pub fn from_env() -> Self {
        Self {
            default_api_key: ApiKey::from_env(),
            ..Self::default()
        }
    }
}

/// Runs untrusted code inside ephemeral sandboxes.
///
/// Each request acquires exactly one sandbox, drives the pipeline strictly
/// sequentially (install, snapshot, run, snapshot, collect), and releases the
/// sandbox on every exit path. Requests share no mutable state, so one
/// orchestrator instance may serve many requests concurrently.
pub struct Orchestrator {
    provider: Arc<dyn SandboxProvider>,
    config: ExecutorConfig,
}

impl Orchestrator {
    pub fn new(provider: Arc<dyn SandboxProvider>, config: ExecutorConfig) -> Self {
        Self { provider, config }
    }

    /// Whether a process-wide default credential is configured.
    pub fn credential_configured(&self) -> bool {
        self.config.default_api_key.is_some()
    }

    /// Execute code with optional dependency installation and output-file
    /// recovery.
    ///
    /// Returns `Err` only for the fatal pre-flight class (no credential,
    /// sandbox could not be provisioned) and for unexpected provider faults;
    /// install failures and execution-level errors come back as a normal
    /// response with `success: false`.
    pub async fn execute(
        &self,
        request: &ExecuteRequest,
        api_key_override: Option<&str>,
    ) -> Result<ExecuteResponse> {
        info!(
            "Advanced execution: code={} chars, deps={:?}, output_files={:?}",
            request.code.len(),
            request.dependencies,
            request.output_files
        );

        let handle = self.acquire(api_key_override).await?;
        let result = self.run_pipeline(&handle, request).await;
        self.release(&handle).await;
        result
    }

    /// Execute code without installation or artifact recovery.
    pub async fn execute_simple(
        &self,
        code: &str,
        timeout: Duration,
        api_key_override: Option<&str>,
    ) -> Result<ExecuteResponse> {
        info!("Executing code (length: {} chars)", code.len());

        let handle = self.acquire(api_key_override).await?;
        let result = runner::run(self.provider.as_ref(), &handle, code, timeout).await;
        self.release(&handle).await;

        let outcome = result?;
        Ok(assemble(outcome, Vec::new(), String::new(), None))
    }

    /// Write the given input files into the sandbox, then execute code that
    /// can access them by filename.
    pub async fn execute_with_files(
        &self,
        code: &str,
        input_files: &[InputFile],
        timeout: Duration,
        api_key_override: Option<&str>,
    ) -> Result<ExecuteResponse> {
        info!("Executing code with {} input files", input_files.len());

        let handle = self.acquire(api_key_override).await?;
        let result = self
            .upload_and_run(&handle, code, input_files, timeout)
            .await;
        self.release(&handle).await;

        let outcome = result?;
        Ok(assemble(outcome, Vec::new(), String::new(), None))
    }

    async fn upload_and_run(
        &self,
        handle: &SandboxHandle,
        code: &str,
        input_files: &[InputFile],
        timeout: Duration,
    ) -> Result<RunOutcome> {
        for file in input_files {
            self.provider
                .write_file(handle, &file.filename, &file.content)
                .await?;
            info!(
                "Uploaded file: {} ({} bytes)",
                file.filename,
                file.content.len()
            );
        }
        runner::run(self.provider.as_ref(), handle, code, timeout).await
    }

    /// The sequential pipeline between acquisition and release.
    async fn run_pipeline(
        &self,
        handle: &SandboxHandle,
        request: &ExecuteRequest,
    ) -> Result<ExecuteResponse> {
        let provider = self.provider.as_ref();
        let started = Instant::now();

        // 1. Install dependencies; failure is fatal for the request and
        //    skips execution and retrieval entirely
        let install_outcome = install::install(
            provider,
            handle,
            &request.dependencies,
            self.config.install_timeout,
        )
        .await;
        if !install_outcome.succeeded() {
            return Ok(ExecuteResponse {
                success: false,
                error: install_outcome.error,
                execution_time: Some(started.elapsed().as_secs_f64()),
                install_output: install_outcome.output,
                ..Default::default()
            });
        }

        // 2. Snapshot before execution so new files can be detected later
        let before = Snapshot::capture(
            provider,
            handle,
            &self.config.home_dir,
            self.config.list_timeout,
        )
        .await;
        info!("Files before execution: {}", before.len());

        // 3. Run user code. An execution-level error still proceeds to
        //    retrieval: partially-produced files are worth returning.
        let timeout = Duration::from_secs(request.timeout);
        let outcome = runner::run(provider, handle, &request.code, timeout).await?;

        // 4. Snapshot after execution and diff
        let after = Snapshot::capture(
            provider,
            handle,
            &self.config.home_dir,
            self.config.list_timeout,
        )
        .await;
        let new_files = before.new_files(&after);
        info!(
            "Files after execution: {}, new files detected: {:?}",
            after.len(),
            new_files
        );

        // 5. Collect requested and auto-detected output files
        let files = artifacts::collect(
            provider,
            handle,
            &request.output_files,
            &new_files,
            &self.config.home_dir,
            self.config.read_timeout,
        )
        .await;

        let execution_time = started.elapsed().as_secs_f64();
        let response = assemble(
            outcome,
            files,
            install_outcome.output,
            Some(execution_time),
        );
        info!(
            "Advanced execution completed: success={}, plots={}, files={}, time={:.2}s",
            response.success,
            response.plots.len(),
            response.files.len(),
            execution_time
        );
        Ok(response)
    }

    async fn acquire(&self, api_key_override: Option<&str>) -> Result<SandboxHandle> {
        let api_key = ApiKey::resolve(api_key_override, self.config.default_api_key.as_ref())
            .ok_or_else(|| {
                ExecutorError::Configuration(format!(
                    "API key not configured. Provide one per request or set {}.",
                    runbox_sandbox::credentials::API_KEY_ENV
                ))
            })?;

        self.provider
            .create_sandbox(&api_key)
            .await
            .map_err(|e| ExecutorError::Provisioning(e.to_string()))
    }

    /// Release the sandbox. Runs on every exit path; a failed release is
    /// logged and swallowed so it never masks the pipeline's own result.
    async fn release(&self, handle: &SandboxHandle) {
        if let Err(e) = self.provider.close_sandbox(handle).await {
            warn!("Failed to close sandbox {}: {e}", handle.id);
        }
    }
}

/// Pure assembly of the terminal response; `success` is exactly
/// "no execution-level error".
fn assemble(
    outcome: RunOutcome,
    files: Vec<FileResult>,
    install_output: String,
    execution_time: Option<f64>,
) -> ExecuteResponse {
    ExecuteResponse {
        success: outcome.error.is_none(),
        stdout: outcome.stdout,
        stderr: outcome.stderr,
        error: outcome.error,
        plots: outcome.plots,
        files,
        execution_time,
        install_output,
    }
}
