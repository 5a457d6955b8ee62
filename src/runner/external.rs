//! Candidate runner: the workload in a separate, prebuilt executable.
//!
//! The executable is invoked as
//! `<binary> --input <path> --filter-threshold <threshold>` and must print the
//! labelled lines described in [`crate::extract`], exiting 0 on success.
//!
//! `total_s` brackets spawn, execution and exit with one monotonic
//! measurement, so it includes process start-up. The in-process baseline pays
//! no such cost; the comparison keeps this asymmetry on purpose because it is
//! part of what running a separate tool costs.

use std::{
    path::{Path, PathBuf},
    process::{Command, Stdio},
    time::Instant,
};
use tracing::{debug, info, warn};

use crate::{
    config::CANDIDATE_BINARY_NAMES,
    extract::extract_metrics,
    runner::{RunFailure, RunOutcome, RunResult},
};

/// Directory searched for the candidate executable.
pub fn release_dir(workspace: &Path) -> PathBuf {
    workspace.join("target").join("release")
}

/// First accepted executable name present under `<workspace>/target/release`.
pub fn find_binary(workspace: &Path) -> Option<PathBuf> {
    let dir = release_dir(workspace);
    CANDIDATE_BINARY_NAMES
        .iter()
        .map(|name| dir.join(format!("{name}{}", std::env::consts::EXE_SUFFIX)))
        .find(|path| path.is_file())
}

/// Locates the candidate under `workspace` and runs it.
pub fn run(path: &Path, threshold: f64, workspace: &Path) -> RunOutcome {
    let Some(binary) = find_binary(workspace) else {
        let searched = release_dir(workspace);
        warn!(searched = %searched.display(), "candidate binary not found");
        return Err(RunFailure::BinaryNotFound { searched });
    };
    run_binary(&binary, path, threshold)
}

/// Runs `binary` on the dataset and extracts its reported metrics.
///
/// Blocks until the process exits; there is no timeout.
pub fn run_binary(binary: &Path, path: &Path, threshold: f64) -> RunOutcome {
    info!(binary = %binary.display(), "running candidate");

    let mut command = Command::new(binary);
    command
        .arg("--input")
        .arg(path)
        .arg("--filter-threshold")
        .arg(threshold.to_string())
        .stdin(Stdio::null());

    let t_start = Instant::now();
    let output = command.output().map_err(|source| RunFailure::Spawn {
        binary: binary.to_path_buf(),
        source,
    })?;
    let total_s = t_start.elapsed().as_secs_f64();

    debug!(status = ?output.status, total_s, "candidate exited");

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        return Err(match output.status.code() {
            Some(code) => RunFailure::NonZeroExit { code, stderr },
            None => RunFailure::Terminated { stderr },
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let metrics = extract_metrics(&stdout)?;

    Ok(RunResult {
        total_rows: metrics.total_rows,
        filtered_rows: metrics.filtered_rows,
        average: metrics.average,
        phases: Vec::new(),
        reported_wall_clock: metrics.wall_clock,
        total_s,
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::runner::Average;
    use std::{fs, os::unix::fs::PermissionsExt};
    use tempfile::TempDir;

    /// Workspace whose `target/release/<name>` is a shell script with `body`.
    fn workspace_with_script(name: &str, body: &str) -> TempDir {
        let ws = tempfile::tempdir().unwrap();
        let dir = release_dir(ws.path());
        fs::create_dir_all(&dir).unwrap();
        let script = dir.join(name);
        fs::write(&script, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        ws
    }

    #[test]
    fn test_missing_binary() {
        let ws = tempfile::tempdir().unwrap();
        let err = run(Path::new("data.csv"), 50.0, ws.path()).unwrap_err();
        match err {
            RunFailure::BinaryNotFound { searched } => {
                assert_eq!(searched, ws.path().join("target").join("release"))
            }
            other => panic!("unexpected failure {other}"),
        }
    }

    #[test]
    fn test_second_name_is_accepted() {
        let ws = workspace_with_script("rust_cli", "exit 0");
        let found = find_binary(ws.path()).unwrap();
        assert!(found.ends_with("rust_cli"));
    }

    #[test]
    fn test_successful_run_is_extracted() {
        let ws = workspace_with_script(
            "rust-cli",
            r#"echo "Input file      : $2"
echo "Filter threshold: $4"
echo "    Total rows read      : 1,000"
echo "    Rows after filter    : 400"
echo "    Average value        : 75.5"
echo "Wall-clock time : 12.5ms""#,
        );
        let result = run(Path::new("data.csv"), 50.0, ws.path()).unwrap();
        assert_eq!(result.total_rows, Some(1_000));
        assert_eq!(result.filtered_rows, Some(400));
        assert_eq!(result.average, Some(Average::Mean(75.5)));
        assert_eq!(result.reported_wall_clock.as_deref(), Some("12.5ms"));
        assert!(result.phases.is_empty());
        assert!(result.total_s > 0.0);
    }

    #[test]
    fn test_arguments_are_passed() {
        let ws = workspace_with_script(
            "rust-cli",
            r#"[ "$1" = "--input" ] && [ "$2" = "in.csv" ] && [ "$3" = "--filter-threshold" ] && [ "$4" = "12.5" ] || exit 9
echo "Total rows read: 1""#,
        );
        let result = run(Path::new("in.csv"), 12.5, ws.path()).unwrap();
        assert_eq!(result.total_rows, Some(1));
    }

    #[test]
    fn test_non_zero_exit_keeps_stderr() {
        let ws = workspace_with_script(
            "rust-cli",
            "echo 'Total rows read: not-parsed'\necho 'boom: bad input' >&2\nexit 3",
        );
        let err = run(Path::new("data.csv"), 50.0, ws.path()).unwrap_err();
        match err {
            RunFailure::NonZeroExit { code, stderr } => {
                assert_eq!(code, 3);
                assert_eq!(stderr, "boom: bad input\n");
            }
            other => panic!("unexpected failure {other}"),
        }
    }

    #[test]
    fn test_malformed_stdout_is_a_failure() {
        let ws = workspace_with_script("rust-cli", "echo 'Rows after filter: many'");
        let err = run(Path::new("data.csv"), 50.0, ws.path()).unwrap_err();
        assert!(matches!(err, RunFailure::Extract(_)));
    }

    #[test]
    fn test_killed_process() {
        let ws = workspace_with_script("rust-cli", "kill -9 $$");
        let err = run(Path::new("data.csv"), 50.0, ws.path()).unwrap_err();
        assert!(matches!(err, RunFailure::Terminated { .. }));
    }
}
