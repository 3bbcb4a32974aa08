// ABOUTME: Filesystem snapshot engine for detecting files created by executed code
// ABOUTME: Normalizes recursive find output and long-form ls listings into one path set

use runbox_sandbox::{SandboxHandle, SandboxProvider};
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::{debug, warn};

/// Path substrings that mark interpreter/runtime bookkeeping files, never
/// surfaced to the caller as artifacts.
const EXCLUDED_PATTERNS: &[&str] = &[".pyc", "__pycache__", ".ipynb_checkpoints", ".cache"];

/// Immutable point-in-time set of regular-file paths under the sandbox home.
///
/// Snapshots are captured once before and once after code execution; the
/// difference between the two is the set of files the code created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    paths: BTreeSet<String>,
}

impl Snapshot {
    /// Capture the current file set under `home_dir`.
    ///
    /// Tries a shallow recursive `find` first and falls back to a long-form
    /// `ls` listing when that fails. Any transport or command failure
    /// degrades to an empty snapshot rather than aborting the request:
    /// artifact detection then simply reports no new files.
    pub async fn capture(
        provider: &dyn SandboxProvider,
        handle: &SandboxHandle,
        home_dir: &str,
        timeout: Duration,
    ) -> Self {
        let find_cmd = format!("find {home_dir} -maxdepth 2 -type f 2>/dev/null");
        match provider.run_command(handle, &find_cmd, timeout).await {
            Ok(output) if output.success() && !output.stdout.trim().is_empty() => {
                let snapshot = Self::from_path_list(&output.stdout);
                debug!("Captured snapshot via find: {} files", snapshot.len());
                return snapshot;
            }
            Ok(_) => {
                debug!("find listing unusable, falling back to ls");
            }
            Err(e) => {
                debug!("find listing failed ({e}), falling back to ls");
            }
        }

        let ls_cmd = format!("ls -la {home_dir}");
        match provider.run_command(handle, &ls_cmd, timeout).await {
            Ok(output) if output.success() => {
                let snapshot = Self::from_long_listing(&output.stdout);
                debug!("Captured snapshot via ls: {} files", snapshot.len());
                snapshot
            }
            Ok(output) => {
                warn!(
                    "Could not list sandbox files (exit {}): {}",
                    output.exit_code,
                    output.stderr.trim()
                );
                Self::default()
            }
            Err(e) => {
                warn!("Could not list sandbox files: {e}");
                Self::default()
            }
        }
    }

    /// Parse one-absolute-path-per-line output (the `find` shape).
    pub fn from_path_list(output: &str) -> Self {
        let paths = output
            .lines()
            .map(str::trim)
            .filter(|line| line.starts_with('/'))
            .map(str::to_string)
            .collect();
        Self { paths }
    }

    /// Parse long-form directory-listing output (the `ls -la` shape): the
    /// filename is the last whitespace-separated field of lines with at
    /// least nine fields. `total` summary lines and anything else that does
    /// not match the shape are ignored.
    pub fn from_long_listing(output: &str) -> Self {
        let paths = output
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with("total"))
            .filter_map(|line| {
                let fields: Vec<&str> = line.split_whitespace().collect();
                if fields.len() >= 9 {
                    fields.last().map(|name| name.to_string())
                } else {
                    None
                }
            })
            .collect();
        Self { paths }
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(path)
    }

    /// Paths present in `after` but not in `self`, with noise filtered out.
    /// Neither snapshot is mutated; the result order is deterministic.
    pub fn new_files(&self, after: &Snapshot) -> Vec<String> {
        after
            .paths
            .difference(&self.paths)
            .filter(|path| !EXCLUDED_PATTERNS.iter().any(|p| path.contains(p)))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot_of(paths: &[&str]) -> Snapshot {
        Snapshot {
            paths: paths.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[test]
    fn test_parse_path_list() {
        let output = "/home/user/a.txt\n/home/user/data/b.csv\n\nnot-a-path\n";
        let snapshot = Snapshot::from_path_list(output);
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.contains("/home/user/a.txt"));
        assert!(snapshot.contains("/home/user/data/b.csv"));
    }

    #[test]
    fn test_parse_long_listing() {
        let output = "total 12\n\
            drwxr-xr-x 2 user user 4096 Jan  1 00:00 .\n\
            drwxr-xr-x 3 root root 4096 Jan  1 00:00 ..\n\
            -rw-r--r-- 1 user user  123 Jan  1 00:00 out.csv\n\
            garbage line\n";
        let snapshot = Snapshot::from_long_listing(output);
        assert!(snapshot.contains("out.csv"));
        assert!(!snapshot.contains("total"));
        assert!(!snapshot.contains("garbage"));
    }

    #[test]
    fn test_long_listing_ignores_short_lines() {
        let snapshot = Snapshot::from_long_listing("one two three\n");
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_new_files_is_set_difference() {
        let before = snapshot_of(&["/home/user/a", "/home/user/b"]);
        let after = snapshot_of(&["/home/user/a", "/home/user/b", "/home/user/c"]);
        assert_eq!(before.new_files(&after), vec!["/home/user/c".to_string()]);

        let identical = snapshot_of(&["/home/user/a", "/home/user/b"]);
        assert!(before.new_files(&identical).is_empty());
    }

    #[test]
    fn test_new_files_filters_noise() {
        let before = snapshot_of(&[]);
        let after = snapshot_of(&[
            "/home/user/out.csv",
            "/home/user/__pycache__/mod.cpython-311.pyc",
            "/home/user/.cache/pip/wheel.whl",
            "/home/user/.ipynb_checkpoints/nb-checkpoint.ipynb",
            "/home/user/module.pyc",
        ]);
        assert_eq!(before.new_files(&after), vec!["/home/user/out.csv".to_string()]);
    }

    #[test]
    fn test_snapshots_are_independent() {
        let before = snapshot_of(&["/home/user/a"]);
        let after = snapshot_of(&["/home/user/a", "/home/user/b"]);
        let _ = before.new_files(&after);
        // Comparison must not mutate either side
        assert_eq!(before, snapshot_of(&["/home/user/a"]));
        assert_eq!(after.len(), 2);
    }
}
