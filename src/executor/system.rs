//! The real host executor.
//!
//! Spawns commands in their own process group, registers them with the global
//! [`ChildRegistry`] so a signal tears them down, and unregisters them once
//! they exit.

use super::{CommandOutput, CommandSpec, Executor};
use crate::error::{DockerbootError, Result};
use crate::process_guard::{ChildRegistry, CommandProcessGroup};
use std::env;
use std::ffi::OsString;
use std::fs;
use std::os::unix::fs::{DirBuilderExt, PermissionsExt};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, info};

/// Executes against the live system.
#[derive(Debug, Default)]
pub struct SystemExecutor {
    dry_run: bool,
}

impl SystemExecutor {
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }

    fn build(cmd: &CommandSpec) -> Command {
        let mut command = Command::new(&cmd.program);
        command.args(&cmd.args).stdin(Stdio::null());
        for (key, value) in &cmd.env {
            command.env(key, value);
        }
        command.in_new_process_group();
        command
    }

    fn spawn_tracked(mut command: Command, cmd: &CommandSpec) -> Result<std::process::Output> {
        let child = command.spawn().map_err(|e| {
            DockerbootError::command(cmd.to_string(), 127, format!("failed to spawn: {}", e))
        })?;
        let pid = child.id();

        if let Ok(mut registry) = ChildRegistry::global().lock() {
            registry.register(pid, &cmd.program);
        }

        let output = child.wait_with_output();

        if let Ok(mut registry) = ChildRegistry::global().lock() {
            registry.unregister(pid);
        }

        Ok(output?)
    }
}

impl Executor for SystemExecutor {
    fn probe(&self, cmd: &CommandSpec) -> Result<CommandOutput> {
        debug!("probe: {}", cmd);

        let mut command = Self::build(cmd);
        command.stdout(Stdio::piped()).stderr(Stdio::piped());
        let output = Self::spawn_tracked(command, cmd)?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code(),
            success: output.status.success(),
        })
    }

    fn run(&self, cmd: &CommandSpec) -> Result<CommandOutput> {
        if self.dry_run {
            info!("[dry-run] would run: {}", cmd);
            return Ok(CommandOutput::ok(""));
        }

        info!("run: {}", cmd);

        // Package manager progress goes straight to the terminal
        let mut command = Self::build(cmd);
        command.stdout(Stdio::inherit()).stderr(Stdio::piped());
        let output = Self::spawn_tracked(command, cmd)?;

        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        if !stderr.is_empty() {
            eprint!("{}", stderr);
        }

        CommandOutput {
            stdout: String::new(),
            stderr,
            exit_code: output.status.code(),
            success: output.status.success(),
        }
        .ensure_success(cmd)
    }

    fn command_exists(&self, program: &str) -> bool {
        on_search_path(program, env::var_os("PATH"))
    }

    fn path_exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        Ok(fs::read_to_string(path)?)
    }

    fn write_file(&self, path: &Path, contents: &str, mode: u32) -> Result<()> {
        if self.dry_run {
            info!("[dry-run] would write {} (mode {:o})", path.display(), mode);
            return Ok(());
        }

        info!("write: {} (mode {:o})", path.display(), mode);
        fs::write(path, contents)?;
        fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
        Ok(())
    }

    fn create_dir_all(&self, path: &Path, mode: u32) -> Result<()> {
        if path.is_dir() {
            return Ok(());
        }
        if self.dry_run {
            info!("[dry-run] would create directory {} (mode {:o})", path.display(), mode);
            return Ok(());
        }

        info!("mkdir: {} (mode {:o})", path.display(), mode);
        fs::DirBuilder::new().recursive(true).mode(mode).create(path)?;
        Ok(())
    }

    fn is_dry_run(&self) -> bool {
        self.dry_run
    }
}

/// Look `program` up in `search_path` (a PATH-style list) without spawning
/// anything; minimal images often ship no `which` binary.
fn on_search_path(program: &str, search_path: Option<OsString>) -> bool {
    let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("/"));
    which::which_in(program, search_path, cwd).is_ok()
}
