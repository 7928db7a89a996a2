//! Child-process supervisor: spawns the wrapped MCP server with piped stdio
//! and passes its stderr straight through to our own.

use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

use crate::error::{GatewayError, GatewayResult};

/// A running wrapped MCP server. Holds the child handle plus the split
/// stdin/stdout handles the interceptor pipelines read and write directly.
pub struct ChildSupervisor {
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: Option<ChildStdout>,
}

impl ChildSupervisor {
    /// Spawn `command` (already split into argv by the caller) with piped
    /// stdio. `kill_on_drop(true)` means that if the gateway process dies
    /// unexpectedly, the child does not outlive it as an orphan.
    ///
    /// ```
    /// # use contextguard::child::ChildSupervisor;
    /// # tokio_test::block_on(async {
    /// let mut supervisor = ChildSupervisor::spawn(&["true".to_string()])?;
    /// let exit_code = supervisor.wait().await?;
    /// assert_eq!(exit_code, 0);
    /// # Ok::<(), contextguard::GatewayError>(())
    /// # }).unwrap();
    /// ```
    pub fn spawn(argv: &[String]) -> GatewayResult<Self> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| GatewayError::spawn("empty server command"))?;

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| GatewayError::spawn(format!("failed to spawn {program}: {e}")))?;

        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| GatewayError::spawn("child did not provide a stderr handle"))?;

        tokio::spawn(passthrough_stderr(stderr));

        Ok(Self {
            child,
            stdin,
            stdout,
        })
    }

    pub fn take_stdin(&mut self) -> Option<ChildStdin> {
        self.stdin.take()
    }

    pub fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.stdout.take()
    }

    /// The OS process id of the child, if it is still running.
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Wait for the child to exit, returning its exit code. A child killed
    /// by a signal has no exit code (`status.code()` is `None`); that case
    /// maps to `0` rather than being treated as a failure, since the
    /// gateway's own exit status should reflect whether *it* failed, not
    /// how the child happened to be terminated.
    pub async fn wait(&mut self) -> GatewayResult<i32> {
        let status = self
            .child
            .wait()
            .await
            .map_err(|e| GatewayError::transport(format!("child wait failed: {e}")))?;
        Ok(status.code().unwrap_or(0))
    }
}

async fn passthrough_stderr(stderr: tokio::process::ChildStderr) {
    let mut lines = BufReader::new(stderr).lines();
    let mut stderr_out = tokio::io::stderr();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let _ = stderr_out.write_all(line.as_bytes()).await;
                let _ = stderr_out.write_all(b"\n").await;
            }
            Ok(None) => break,
            Err(e) => {
                tracing::debug!(error = %e, "child stderr stream closed with error");
                break;
            }
        }
    }
}
