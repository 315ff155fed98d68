//! External process execution with a hard wall-clock budget.
//!
//! The runner captures both output streams and never interprets exit
//! codes; success criteria belong to the driver. A process that
//! exceeds its budget is killed and reported with `timed_out = true`
//! rather than raised as an error.

use std::path::Path;
use std::time::Duration;

use tokio::process::Command;

use crate::error::{Error, Result};

/// Exit code reported when no status is available (killed by signal
/// or timed out).
pub const NO_EXIT_CODE: i32 = -1;

/// Captured result of one external invocation. Immutable.
#[derive(Debug, Clone)]
pub struct ProcessResult {
    /// Process exit code, or [`NO_EXIT_CODE`].
    pub exit_code: i32,

    /// Full captured standard output.
    pub stdout: String,

    /// Full captured standard error.
    pub stderr: String,

    /// Whether the process was killed for exceeding its budget.
    pub timed_out: bool,
}

impl ProcessResult {
    /// Whether the process reported a zero exit code.
    pub fn success(&self) -> bool {
        !self.timed_out && self.exit_code == 0
    }
}

/// Run `program` with `args` in `working_dir`, enforcing `budget`.
///
/// # Errors
///
/// Returns [`Error::ToolUnavailable`] only if the program cannot be
/// spawned at all; a non-zero exit or timeout is reported in the
/// [`ProcessResult`], not as an error.
pub async fn run(
    program: &Path,
    args: &[&str],
    working_dir: &Path,
    budget: Duration,
) -> Result<ProcessResult> {
    tracing::debug!(
        program = %program.display(),
        ?args,
        working_dir = %working_dir.display(),
        "running external process"
    );

    let mut command = Command::new(program);
    command
        .args(args)
        .current_dir(working_dir)
        .stdin(std::process::Stdio::null())
        // Dropping the output future on timeout must kill the child.
        .kill_on_drop(true);

    let output = command.output();

    match tokio::time::timeout(budget, output).await {
        Ok(Ok(output)) => Ok(ProcessResult {
            exit_code: output.status.code().unwrap_or(NO_EXIT_CODE),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            timed_out: false,
        }),
        Ok(Err(e)) => Err(Error::ToolUnavailable {
            tool: "external process",
            program: format!("{} ({})", program.display(), e),
        }),
        Err(_) => {
            tracing::warn!(
                program = %program.display(),
                budget_secs = budget.as_secs(),
                "process exceeded wall-clock budget, killed"
            );
            Ok(ProcessResult {
                exit_code: NO_EXIT_CODE,
                stdout: String::new(),
                stderr: String::new(),
                timed_out: true,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[cfg(unix)]
    fn sh() -> PathBuf {
        which::which("sh").expect("sh in PATH")
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn test_run_captures_streams_and_exit_code() {
        let temp = TempDir::new().unwrap();
        let result = run(
            &sh(),
            &["-c", "echo out; echo err >&2; exit 3"],
            temp.path(),
            Duration::from_secs(10),
        )
        .await
        .unwrap();

        assert_eq!(result.exit_code, 3);
        assert!(!result.timed_out);
        assert!(!result.success());
        assert_eq!(result.stdout.trim(), "out");
        assert_eq!(result.stderr.trim(), "err");
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn test_run_uses_working_dir() {
        let temp = TempDir::new().unwrap();
        let result = run(
            &sh(),
            &["-c", "pwd"],
            temp.path(),
            Duration::from_secs(10),
        )
        .await
        .unwrap();

        assert!(result.success());
        let reported = PathBuf::from(result.stdout.trim());
        assert_eq!(
            reported.canonicalize().unwrap(),
            temp.path().canonicalize().unwrap()
        );
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn test_run_times_out() {
        let temp = TempDir::new().unwrap();
        let result = run(
            &sh(),
            &["-c", "exec sleep 30"],
            temp.path(),
            Duration::from_millis(100),
        )
        .await
        .unwrap();

        assert!(result.timed_out);
        assert_eq!(result.exit_code, NO_EXIT_CODE);
        assert!(!result.success());
    }

    #[tokio::test]
    async fn test_run_missing_program_is_tool_unavailable() {
        let temp = TempDir::new().unwrap();
        let err = run(
            Path::new("/no/such/texforge-binary"),
            &[],
            temp.path(),
            Duration::from_secs(1),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, Error::ToolUnavailable { .. }));
    }
}
