// ABOUTME: Dependency installation step run inside the sandbox before user code
// ABOUTME: One bounded pip invocation; any failure is fatal for the request

use runbox_sandbox::{SandboxHandle, SandboxProvider};
use std::time::Duration;
use tracing::{error, info};

/// Outcome of the dependency-install step.
#[derive(Debug, Clone, Default)]
pub struct InstallOutcome {
    /// Combined stdout and stderr of the install command, captured
    /// regardless of exit status; empty when there was nothing to install
    pub output: String,
    /// Present when installation failed; the pipeline must stop here
    pub error: Option<String>,
}

impl InstallOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Install packages inside the sandbox.
///
/// No-op for an empty dependency list. Otherwise issues a single package
/// manager invocation bounded by `timeout`. A transport error, timeout, or
/// non-zero exit all produce a failure outcome; installation failure is
/// fatal for the request, not recoverable.
pub async fn install(
    provider: &dyn SandboxProvider,
    handle: &SandboxHandle,
    dependencies: &[String],
    timeout: Duration,
) -> InstallOutcome {
    if dependencies.is_empty() {
        return InstallOutcome::default();
    }

    let deps = dependencies.join(" ");
    info!("Installing dependencies: {deps}");

    let command = format!("pip install -q {deps}");
    match provider.run_command(handle, &command, timeout).await {
        Ok(output) => {
            let combined = format!("{}{}", output.stdout, output.stderr);
            if output.success() {
                info!("Dependencies installed");
                InstallOutcome {
                    output: combined,
                    error: None,
                }
            } else {
                error!("Dependency installation exited with {}", output.exit_code);
                InstallOutcome {
                    output: combined,
                    error: Some(format!(
                        "Failed to install dependencies: pip exited with status {}",
                        output.exit_code
                    )),
                }
            }
        }
        Err(e) => {
            error!("Dependency installation failed: {e}");
            InstallOutcome {
                output: e.to_string(),
                error: Some(format!("Failed to install dependencies: {e}")),
            }
        }
    }
}
