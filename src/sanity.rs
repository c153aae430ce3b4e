//! Pre-flight checks and privilege escalation
//!
//! Provisioning needs root to install packages, write repository files and
//! manage services. When started as a regular user the binary re-executes
//! itself through `sudo` (or `doas`), passing every resolved setting as an
//! explicit flag since the elevated environment is reset.

use crate::config::ProvisionConfig;
use crate::error::{DockerbootError, Result};
use crate::executor::{CommandSpec, Executor};
use std::convert::Infallible;
use std::os::unix::process::CommandExt;
use std::process::Command;

/// Result of environment verification
#[derive(Debug)]
pub struct SanityCheckResult {
    pub missing_binaries: Vec<String>,
    pub is_root: bool,
}

impl SanityCheckResult {
    /// Required tools present; root is checked separately since it can be
    /// fixed by escalating.
    pub fn binaries_ok(&self) -> bool {
        self.missing_binaries.is_empty()
    }
}

/// Tools every run relies on regardless of distribution
const REQUIRED_BINARIES: &[&str] = &[
    "uname", // Architecture detection (coreutils)
    "id",    // Group membership lookup (coreutils)
];

/// Check if running as root (EUID 0)
pub fn is_running_as_root() -> bool {
    nix::unistd::geteuid().is_root()
}

/// Verify required tools through `exec` and report the effective UID.
pub fn verify_environment(exec: &dyn Executor) -> SanityCheckResult {
    let missing_binaries = REQUIRED_BINARIES
        .iter()
        .filter(|binary| !exec.command_exists(binary))
        .map(|binary| (*binary).to_string())
        .collect();

    SanityCheckResult {
        missing_binaries,
        is_root: is_running_as_root(),
    }
}

/// Fail early when a required tool is missing.
pub fn run_preflight_checks(exec: &dyn Executor) -> Result<SanityCheckResult> {
    tracing::debug!("Running pre-flight sanity checks...");

    let result = verify_environment(exec);
    if !result.binaries_ok() {
        return Err(DockerbootError::config(format!(
            "missing required tools: {}",
            result.missing_binaries.join(", ")
        )));
    }

    tracing::debug!("Pre-flight checks passed: root={}", result.is_root);
    Ok(result)
}

/// First available privilege helper, `sudo` preferred.
pub fn escalation_helper(exec: &dyn Executor) -> Option<&'static str> {
    ["sudo", "doas"]
        .into_iter()
        .find(|helper| exec.command_exists(helper))
}

/// Arguments that reproduce `config` as a `provision` invocation.
pub fn escalation_args(config: &ProvisionConfig) -> Vec<String> {
    let mut args = vec![
        "provision".to_string(),
        "--min-version".to_string(),
        config.min_version.clone(),
        "--compose-version".to_string(),
        config.compose_version.clone(),
        "--compose-dir".to_string(),
        config.compose_dir.display().to_string(),
    ];
    if let Some(user) = &config.target_user {
        args.push("--user".to_string());
        args.push(user.clone());
    }
    if config.json {
        args.push("--json".to_string());
    }
    args
}

/// The full command used to re-run this binary as root.
pub fn escalation_command(helper: &str, program: &str, config: &ProvisionConfig) -> CommandSpec {
    CommandSpec::new(helper)
        .arg(program)
        .args(escalation_args(config))
}

/// Replace the current process with an elevated copy of itself.
///
/// Only returns on failure; success replaces this process.
pub fn escalate(exec: &dyn Executor, config: &ProvisionConfig) -> Result<Infallible> {
    let helper = escalation_helper(exec).ok_or_else(|| {
        DockerbootError::privilege("root privileges required and neither sudo nor doas is available")
    })?;

    let program = std::env::current_exe()?;
    let spec = escalation_command(helper, &program.display().to_string(), config);
    tracing::info!("Not running as root, re-executing via {}", helper);
    tracing::debug!("Escalating: {}", spec);

    let err = Command::new(&spec.program).args(&spec.args).exec();
    Err(DockerbootError::privilege(format!(
        "failed to re-execute via {}: {}",
        helper, err
    )))
}
