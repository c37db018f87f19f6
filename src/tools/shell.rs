use super::executor::{non_empty_trimmed, ToolExecutor};
use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::io::Read;
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const POLL_INTERVAL: Duration = Duration::from_millis(25);

#[derive(Debug, Serialize)]
struct ShellOutput {
    stdout: String,
    stderr: String,
    exit_code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ToolExecutor {
    /// Runs `command` through `sh -c` and reports its output as JSON.
    ///
    /// The child is polled rather than waited on so that a cancelled token can
    /// kill it. A non-zero exit is a normal result, not an error.
    pub fn run_shell_command(
        &self,
        command: &str,
        directory: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let command = non_empty_trimmed(command)
            .context("run_shell_command requires a non-empty 'command' field")?;
        let dir = self.resolve_optional_path(directory)?;

        let mut child = Command::new("sh")
            .arg("-c")
            .arg(command)
            .current_dir(&dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .context("Failed to spawn shell")?;

        let stdout_reader = child.stdout.take().map(spawn_reader);
        let stderr_reader = child.stderr.take().map(spawn_reader);

        let status = loop {
            if let Some(status) = child.try_wait().context("Failed to poll shell command")? {
                break status;
            }
            if cancel.is_cancelled() {
                let _ = child.kill();
                let _ = child.wait();
                bail!("Command cancelled: {command}");
            }
            thread::sleep(POLL_INTERVAL);
        };

        let output = ShellOutput {
            stdout: join_reader(stdout_reader),
            stderr: join_reader(stderr_reader),
            exit_code: status.code().unwrap_or(-1),
            error: (!status.success()).then(|| status.to_string()),
        };
        serde_json::to_string_pretty(&output).context("failed to encode shell output")
    }
}

fn spawn_reader<R: Read + Send + 'static>(mut source: R) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = source.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn join_reader(handle: Option<thread::JoinHandle<String>>) -> String {
    handle
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default()
}
