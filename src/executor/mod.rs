//! Host access layer.
//!
//! Every external command and every file the provisioning run touches goes
//! through the [`Executor`] trait. The split between [`Executor::probe`] and
//! [`Executor::run`] is what makes dry-run possible: probes are read-only and
//! always execute, runs change the host and are skipped in dry-run.

mod system;

pub use system::SystemExecutor;

use crate::error::{DockerbootError, Result};
use std::fmt;
use std::path::Path;

/// A fully specified external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.env {
            write!(f, "{}={} ", key, value)?;
        }
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Output from a command execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Standard output (empty for streamed runs).
    pub stdout: String,
    /// Standard error (empty for streamed runs).
    pub stderr: String,
    /// Exit code (None if terminated by signal).
    pub exit_code: Option<i32>,
    /// Whether the command exited successfully (exit code 0).
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

    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            exit_code: Some(code),
            success: false,
        }
    }

    /// Check if the command succeeded and return an error if not.
    pub fn ensure_success(self, command: &CommandSpec) -> Result<Self> {
        if self.success {
            Ok(self)
        } else {
            Err(DockerbootError::command(
                command.to_string(),
                self.exit_code.unwrap_or(-1),
                self.stderr.trim(),
            ))
        }
    }

    /// Trimmed stdout.
    pub fn text(&self) -> &str {
        self.stdout.trim()
    }
}

/// Everything the provisioning run needs from the host.
pub trait Executor {
    /// Run a read-only command and capture its output.
    ///
    /// Never fails on a non-zero exit; callers inspect `success`. Fails only
    /// if the program cannot be spawned at all.
    fn probe(&self, cmd: &CommandSpec) -> Result<CommandOutput>;

    /// Run a command that changes the host.
    ///
    /// Returns an error if the command exits non-zero. Skipped (reported as
    /// success) in dry-run mode.
    fn run(&self, cmd: &CommandSpec) -> Result<CommandOutput>;

    /// Whether `program` resolves on `PATH`.
    fn command_exists(&self, program: &str) -> bool;

    fn path_exists(&self, path: &Path) -> bool;

    fn read_to_string(&self, path: &Path) -> Result<String>;

    /// Write `contents` to `path` and set its permission bits to `mode`.
    fn write_file(&self, path: &Path, contents: &str, mode: u32) -> Result<()>;

    /// Create `path` and its parents with permission bits `mode`.
    fn create_dir_all(&self, path: &Path, mode: u32) -> Result<()>;

    fn is_dry_run(&self) -> bool;

    /// Run a command whose failure is tolerated.
    ///
    /// Returns whether it succeeded; failures are logged and swallowed.
    fn run_non_fatal(&self, cmd: &CommandSpec) -> bool {
        match self.run(cmd) {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!("Ignoring failure of non-fatal step: {}", e);
                false
            }
        }
    }

    /// Probe and return trimmed stdout on success.
    fn probe_text(&self, cmd: &CommandSpec) -> Option<String> {
        match self.probe(cmd) {
            Ok(output) if output.success => Some(output.text().to_string()),
            Ok(_) => None,
            Err(e) => {
                tracing::debug!("Probe `{}` could not run: {}", cmd, e);
                None
            }
        }
    }
}

/// Outcome of [`write_if_changed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileChange {
    Unchanged,
    Written,
}

/// Write a file only when its current content differs.
pub fn write_if_changed(
    exec: &dyn Executor,
    path: &Path,
    contents: &str,
    mode: u32,
) -> Result<FileChange> {
    if exec.path_exists(path) {
        if let Ok(current) = exec.read_to_string(path) {
            if current == contents {
                tracing::debug!("{} already up to date", path.display());
                return Ok(FileChange::Unchanged);
            }
        }
    }

    exec.write_file(path, contents, mode)?;
    Ok(FileChange::Written)
}
