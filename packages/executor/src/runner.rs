// ABOUTME: Execution runner submitting user code to the sandbox
// ABOUTME: Joins log streams and folds notebook-style result values into the outcome

use crate::error::Result;
use crate::types::PlotResult;
use runbox_sandbox::{ResultValue, SandboxHandle, SandboxProvider};
use std::time::Duration;
use tracing::{debug, warn};

/// What one code submission produced, after log joining and result-value
/// handling. An execution-level error lives here; a transport failure is an
/// `Err` from [`run`] instead.
#[derive(Debug, Clone, Default)]
pub struct RunOutcome {
    pub stdout: String,
    pub stderr: String,
    pub error: Option<String>,
    pub plots: Vec<PlotResult>,
}

/// Submit code for synchronous evaluation and collect its outcome.
///
/// Multi-line log fragments are joined with newlines into single strings
/// (empty, not absent, when there was no output). Image result values become
/// plots in production order; text result values are appended to stdout the
/// way an interactive notebook surfaces the trailing expression's value.
pub async fn run(
    provider: &dyn SandboxProvider,
    handle: &SandboxHandle,
    code: &str,
    timeout: Duration,
) -> Result<RunOutcome> {
    let execution = provider.run_code(handle, code, timeout).await?;

    let stdout = execution.stdout.join("\n");
    let stderr = execution.stderr.join("\n");

    if let Some(error) = &execution.error {
        warn!("Execution error: {error}");
    }

    let mut plots = Vec::new();
    let mut result_texts = Vec::new();
    for (i, value) in execution.results.iter().enumerate() {
        match value {
            ResultValue::Image { format, data } => {
                debug!("Result {i}: {format} image, {} bytes (base64)", data.len());
                plots.push(PlotResult {
                    format: format.clone(),
                    data: data.clone(),
                });
            }
            ResultValue::Text(text) => {
                debug!("Result {i}: text value ({} chars)", text.len());
                result_texts.push(text.clone());
            }
            ResultValue::Other => {}
        }
    }

    Ok(RunOutcome {
        stdout: merge_result_texts(stdout, &result_texts),
        stderr,
        error: execution.error,
        plots,
    })
}

/// Append collected result texts to stdout, newline-joined, with no leading
/// newline when stdout was empty.
fn merge_result_texts(stdout: String, result_texts: &[String]) -> String {
    if result_texts.is_empty() {
        return stdout;
    }
    let joined = result_texts.join("\n");
    if stdout.is_empty() {
        joined
    } else {
        format!("{stdout}\n{joined}")
    }
}
