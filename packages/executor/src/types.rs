// ABOUTME: Request and response types for orchestrated code execution
// ABOUTME: Mirrors the wire shape the HTTP layer validates and serializes

use serde::{Deserialize, Serialize};

fn default_timeout_secs() -> u64 {
    30
}

/// A validated request to execute untrusted code.
///
/// Immutable once accepted; the orchestrator only reads from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteRequest {
    /// Untrusted source code to run inside the sandbox
    pub code: String,
    /// Execution timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout: u64,
    /// Packages to install before the code runs
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Paths to retrieve after execution, in addition to auto-detected files
    #[serde(default)]
    pub output_files: Vec<String>,
}

impl ExecuteRequest {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            timeout: default_timeout_secs(),
            dependencies: Vec::new(),
            output_files: Vec::new(),
        }
    }
}

/// A plot rendered by the executed code, delivered base64-encoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotResult {
    /// Image format, e.g. "png"
    pub format: String,
    /// Base64-encoded image data
    pub data: String,
}

/// A file recovered from the sandbox after execution.
///
/// Only the basename is preserved; directory structure inside the sandbox is
/// not reproduced for the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileResult {
    pub filename: String,
    /// Base64-encoded file content
    pub data: String,
    /// Raw (pre-encoding) length in bytes
    pub size: usize,
}

/// A named file to place into the sandbox before the code runs.
#[derive(Debug, Clone)]
pub struct InputFile {
    pub filename: String,
    pub content: Vec<u8>,
}

/// Terminal result of one orchestrated execution.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecuteResponse {
    /// True exactly when `error` is absent
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub plots: Vec<PlotResult>,
    #[serde(default)]
    pub files: Vec<FileResult>,
    /// Wall-clock seconds from sandbox acquisition to artifact collection
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_time: Option<f64>,
    /// Combined output of the dependency-install step, empty when skipped
    #[serde(default)]
    pub install_output: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults() {
        let request: ExecuteRequest = serde_json::from_str(r#"{"code": "print(1)"}"#).unwrap();
        assert_eq!(request.timeout, 30);
        assert!(request.dependencies.is_empty());
        assert!(request.output_files.is_empty());
    }

    #[test]
    fn test_response_omits_absent_error() {
        let response = ExecuteResponse {
            success: true,
            stdout: "2".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("\"error\""));
    }
}
