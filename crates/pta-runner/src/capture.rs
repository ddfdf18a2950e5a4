//! Combined stdout/stderr capture for child processes.

use std::io;
use std::process::{ExitStatus, Stdio};

use camino::Utf8Path;
use tokio::io::AsyncReadExt;
use tokio::process::Command;

use crate::error::RunError;

const CHUNK_SIZE: usize = 4096;

/// Creates a command rooted at `working_dir`.
pub(crate) fn command(program: &str, args: &[String], working_dir: &Utf8Path) -> Command {
    let mut cmd = Command::new(program);
    cmd.args(args).current_dir(working_dir.as_std_path());
    cmd
}

/// Output of a finished command.
#[derive(Debug)]
pub(crate) struct CombinedOutput {
    pub status: ExitStatus,
    /// Stdout and stderr interleaved in the order chunks arrived.
    pub bytes: Vec<u8>,
}

/// Runs `cmd` to completion, collecting stdout and stderr into one buffer.
///
/// Both pipes are drained concurrently so neither can fill up and stall the
/// child while the other is being read.
pub(crate) async fn run_combined(mut cmd: Command, program: &str) -> Result<CombinedOutput, RunError> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = cmd.spawn().map_err(|source| RunError::Spawn {
        program: program.to_owned(),
        source,
    })?;

    let (Some(mut stdout), Some(mut stderr)) = (child.stdout.take(), child.stderr.take()) else {
        return Err(RunError::Capture(io::Error::other("child pipes were not captured")));
    };

    let mut bytes = Vec::new();
    let mut out_buf = [0u8; CHUNK_SIZE];
    let mut err_buf = [0u8; CHUNK_SIZE];
    let mut out_open = true;
    let mut err_open = true;

    while out_open || err_open {
        tokio::select! {
            read = stdout.read(&mut out_buf), if out_open => match read? {
                0 => out_open = false,
                n => bytes.extend_from_slice(&out_buf[..n]),
            },
            read = stderr.read(&mut err_buf), if err_open => match read? {
                0 => err_open = false,
                n => bytes.extend_from_slice(&err_buf[..n]),
            },
        }
    }

    let status = child.wait().await?;
    Ok(CombinedOutput { status, bytes })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> Command {
        command(
            "sh",
            &["-c".to_owned(), script.to_owned()],
            Utf8Path::new("."),
        )
    }

    #[tokio::test]
    async fn test_captures_both_streams() {
        let output = run_combined(sh("echo out; echo err 1>&2"), "sh")
            .await
            .expect("sh should run");

        let text = String::from_utf8_lossy(&output.bytes);
        assert!(output.status.success());
        assert!(text.contains("out\n"));
        assert!(text.contains("err\n"));
    }

    #[tokio::test]
    async fn test_preserves_order_across_streams() {
        let script = "echo first; sleep 0.1; echo second 1>&2; sleep 0.1; echo third";
        let output = run_combined(sh(script), "sh").await.expect("sh should run");

        assert_eq!(String::from_utf8_lossy(&output.bytes), "first\nsecond\nthird\n");
    }

    #[tokio::test]
    async fn test_reports_exit_status() {
        let output = run_combined(sh("exit 3"), "sh").await.expect("sh should run");
        assert_eq!(output.status.code(), Some(3));
    }

    #[tokio::test]
    async fn test_spawn_failure() {
        let cmd = command("/nonexistent/pta/test-tool", &[], Utf8Path::new("."));
        let err = run_combined(cmd, "/nonexistent/pta/test-tool")
            .await
            .expect_err("spawn should fail");
        assert!(err.is_spawn());
    }
}
