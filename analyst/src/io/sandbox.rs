//! Isolated, timeout-bounded execution of one generated artifact.
//!
//! Every invocation writes the artifact into a fresh ephemeral workspace,
//! runs it there as an independent process, and classifies the result. The
//! workspace is owned by a [`tempfile::TempDir`], so it is removed on every
//! exit path, including timeouts and host-side faults during setup.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use tracing::{debug, instrument, warn};

use crate::core::types::Artifact;
use crate::io::process::run_command_with_timeout;

const SCRIPT_NAME: &str = "task_script.py";

/// Classified result of one sandbox run.
///
/// A failed run is a value, not a Rust error: the retry controller absorbs
/// failures and converts them into forward progress. Only the diagnostic text
/// of a failure survives; the artifact itself is never persisted on failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutcome {
    pub success: bool,
    /// Captured standard output (empty on failure paths without output).
    pub stdout: String,
    /// Combined diagnostic text; empty on success.
    pub diagnostic: String,
}

impl ExecutionOutcome {
    fn success(stdout: String) -> Self {
        Self {
            success: true,
            stdout,
            diagnostic: String::new(),
        }
    }

    fn failure(stdout: String, diagnostic: String) -> Self {
        Self {
            success: false,
            stdout,
            diagnostic,
        }
    }
}

/// Seam between the retry controller and the execution backend. Tests use
/// scripted runners that never spawn processes.
pub trait Runner {
    fn run(&self, artifact: &Artifact) -> ExecutionOutcome;
}

/// Runner that executes artifacts with a configured interpreter.
#[derive(Debug, Clone)]
pub struct SandboxRunner {
    interpreter: String,
    timeout: Duration,
    output_limit_bytes: usize,
    workspace_root: Option<PathBuf>,
}

impl SandboxRunner {
    pub fn new(interpreter: impl Into<String>, timeout: Duration, output_limit_bytes: usize) -> Self {
        Self {
            interpreter: interpreter.into(),
            timeout,
            output_limit_bytes,
            workspace_root: None,
        }
    }

    /// Allocate workspaces under `root` instead of the system temp directory.
    pub fn with_workspace_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.workspace_root = Some(root.into());
        self
    }

    fn allocate_workspace(&self) -> std::io::Result<tempfile::TempDir> {
        match &self.workspace_root {
            Some(root) => tempfile::tempdir_in(root),
            None => tempfile::tempdir(),
        }
    }
}

impl Runner for SandboxRunner {
    #[instrument(skip_all, fields(timeout_secs = self.timeout.as_secs()))]
    fn run(&self, artifact: &Artifact) -> ExecutionOutcome {
        // TempDir removes the workspace on drop, which covers every return
        // below as well as the early error paths inside run_in_workspace.
        let workspace = match self.allocate_workspace() {
            Ok(dir) => dir,
            Err(err) => {
                warn!(err = %err, "failed to allocate sandbox workspace");
                return ExecutionOutcome::failure(
                    String::new(),
                    format!("sandbox setup failed: {err}"),
                );
            }
        };

        let outcome = self.run_in_workspace(workspace.path(), artifact);

        if let Err(err) = workspace.close() {
            // The directory is gone or going; nothing actionable beyond a log.
            warn!(err = %err, "sandbox workspace teardown reported an error");
        }
        outcome
    }
}

impl SandboxRunner {
    fn run_in_workspace(&self, workspace: &Path, artifact: &Artifact) -> ExecutionOutcome {
        let script_path = workspace.join(SCRIPT_NAME);
        if let Err(err) = fs::write(&script_path, artifact.script()) {
            warn!(err = %err, "failed to write sandbox script");
            return ExecutionOutcome::failure(
                String::new(),
                format!("sandbox setup failed: could not write script: {err}"),
            );
        }

        let mut cmd = Command::new(&self.interpreter);
        cmd.arg(SCRIPT_NAME).current_dir(workspace);

        debug!(interpreter = %self.interpreter, "executing artifact");
        let output =
            match run_command_with_timeout(cmd, None, self.timeout, self.output_limit_bytes) {
                Ok(output) => output,
                Err(err) => {
                    warn!(err = %err, "sandbox execution fault");
                    return ExecutionOutcome::failure(
                        String::new(),
                        format!("sandbox execution fault: {err:#}"),
                    );
                }
            };

        if output.timed_out {
            return ExecutionOutcome::failure(
                output.stdout_text(),
                format!(
                    "execution timed out after {} seconds",
                    self.timeout.as_secs()
                ),
            );
        }
        if !output.status.success() {
            let diagnostic = format!(
                "execution failed with status {:?}\n\nstdout:\n{}\n\nstderr:\n{}",
                output.status.code(),
                output.stdout_text().trim(),
                output.stderr_text().trim(),
            );
            return ExecutionOutcome::failure(output.stdout_text(), diagnostic);
        }

        debug!("artifact executed successfully");
        ExecutionOutcome::success(output.stdout_text())
    }
}
