//! Subprocess seam for the tracker CLI.
//!
//! `SystemRunner` spawns real processes; tests substitute a scripted runner.
//! Calls block until the child exits. There is no timeout.

use std::process::{Command, Stdio};

/// Captured result of one process invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process never started or was killed by a signal.
    pub exit_code: Option<i32>,
    pub success: bool,
}

impl CommandOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            exit_code: Some(0),
            success: true,
        }
    }

    pub fn failed(stderr: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            exit_code: Some(1),
            success: false,
        }
    }

    /// Failure detail: stderr, else stdout, else a generic message.
    pub fn failure_detail(&self) -> String {
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            return stderr.to_string();
        }
        let stdout = self.stdout.trim();
        if !stdout.is_empty() {
            return stdout.to_string();
        }
        match self.exit_code {
            Some(code) => format!("command exited with status {code}"),
            None => "command terminated without an exit status".to_string(),
        }
    }
}

pub trait CommandRunner {
    /// Whether `program` can be located.
    fn is_available(&self, program: &str) -> bool;

    /// Run `program` with `args`, stdin closed, output captured.
    fn run(&self, program: &str, args: &[&str]) -> CommandOutput;
}

/// Runs real processes, resolving programs on `PATH`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn is_available(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }

    fn run(&self, program: &str, args: &[&str]) -> CommandOutput {
        let result = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output();

        match result {
            Ok(output) => CommandOutput {
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                exit_code: output.status.code(),
                success: output.status.success(),
            },
            Err(e) => {
                tracing::warn!(program, error = %e, "failed to spawn");
                CommandOutput {
                    stdout: String::new(),
                    stderr: format!("failed to execute {program}: {e}"),
                    exit_code: None,
                    success: false,
                }
            }
        }
    }
}
