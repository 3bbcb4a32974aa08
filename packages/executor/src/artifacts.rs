// ABOUTME: Artifact retrieval: reads requested and auto-detected files out of the sandbox
// ABOUTME: Ordered candidate-path fallback with basename deduplication and base64 encoding

use crate::types::FileResult;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use runbox_sandbox::{FileContent, SandboxHandle, SandboxProvider};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{info, warn};

/// Collect output files from the sandbox.
///
/// Explicitly requested paths come first, in caller order, each read directly
/// by its given path; a failed read is logged and skipped, never fatal. Then
/// diff-detected new files: a path whose basename was already collected from
/// the requested set is skipped, otherwise an ordered list of candidate paths
/// is tried and the first successful read wins.
pub async fn collect(
    provider: &dyn SandboxProvider,
    handle: &SandboxHandle,
    requested: &[String],
    new_files: &[String],
    home_dir: &str,
    read_timeout: Duration,
) -> Vec<FileResult> {
    let mut files = Vec::new();
    let mut collected: HashSet<String> = HashSet::new();

    for path in requested {
        match read_file(provider, handle, path, read_timeout).await {
            Some(content) => {
                let name = basename(path);
                info!("Retrieved requested file {path} ({} bytes)", content.len());
                files.push(record_from_bytes(name, &content));
                collected.insert(name.to_string());
            }
            None => {
                warn!("Could not retrieve requested file {path}");
            }
        }
    }

    for path in new_files {
        let name = basename(path);
        if collected.contains(name) {
            continue;
        }

        let mut content = None;
        for candidate in candidate_paths(path, home_dir) {
            if let Some(bytes) = read_file(provider, handle, &candidate, read_timeout).await {
                content = Some(bytes);
                break;
            }
        }

        match content {
            Some(bytes) => {
                info!("Retrieved auto-detected file {name} ({} bytes)", bytes.len());
                files.push(record_from_bytes(name, &bytes));
                collected.insert(name.to_string());
            }
            None => {
                warn!("Could not retrieve auto-detected file {path}");
            }
        }
    }

    files
}

/// The ordered retrieval strategies for a diff-detected path: the path as
/// reported, the same basename reconstructed under the sandbox home, and the
/// bare basename relative to the working directory.
fn candidate_paths(path: &str, home_dir: &str) -> Vec<String> {
    let name = basename(path);
    vec![
        path.to_string(),
        format!("{home_dir}/{name}"),
        name.to_string(),
    ]
}

fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn record_from_bytes(filename: &str, content: &[u8]) -> FileResult {
    FileResult {
        filename: filename.to_string(),
        data: STANDARD.encode(content),
        size: content.len(),
    }
}

async fn read_file(
    provider: &dyn SandboxProvider,
    handle: &SandboxHandle,
    path: &str,
    read_timeout: Duration,
) -> Option<Vec<u8>> {
    match tokio::time::timeout(read_timeout, provider.read_file(handle, path)).await {
        Ok(Ok(content)) => Some(FileContent::into_bytes(content)),
        Ok(Err(e)) => {
            warn!("Read failed for {path}: {e}");
            None
        }
        Err(_) => {
            warn!("Read timed out for {path} after {read_timeout:?}");
            None
        }
    }
}
