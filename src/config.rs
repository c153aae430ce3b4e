//! Provisioning configuration.
//!
//! Values come from CLI flags, which fall back to environment variables and
//! then to the defaults below (see `cli.rs`). Host paths are configurable so
//! detection can be pointed at fixtures.

use crate::error::{DockerbootError, Result};
use crate::version::DottedVersion;
use std::path::PathBuf;
use std::time::Duration;

/// Oldest engine that ships the compose v2 plugin interface.
pub const DEFAULT_MIN_VERSION: &str = "20.10.0";

/// Compose release used by the manual plugin fallback.
pub const DEFAULT_COMPOSE_VERSION: &str = "v2.29.7";

pub const DEFAULT_COMPOSE_DIR: &str = "/usr/local/lib/docker/cli-plugins";

pub const DOCKER_DOWNLOAD_BASE: &str = "https://download.docker.com/linux";

pub const COMPOSE_RELEASES_BASE: &str = "https://github.com/docker/compose/releases/download";

/// Files read during host detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPaths {
    pub os_release: PathBuf,
    pub kernel_osrelease: PathBuf,
    pub proc_version: PathBuf,
}

impl Default for HostPaths {
    fn default() -> Self {
        Self {
            os_release: PathBuf::from("/etc/os-release"),
            kernel_osrelease: PathBuf::from("/proc/sys/kernel/osrelease"),
            proc_version: PathBuf::from("/proc/version"),
        }
    }
}

/// How long to wait for the daemon after starting it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DaemonWait {
    pub attempts: u32,
    pub interval: Duration,
}

impl Default for DaemonWait {
    fn default() -> Self {
        Self {
            attempts: 15,
            interval: Duration::from_secs(1),
        }
    }
}

/// Resolved settings for one provisioning run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionConfig {
    pub min_version: String,
    /// Always carries a leading `v`, as release tags do
    pub compose_version: String,
    pub compose_dir: PathBuf,
    /// Account to add to the `docker` group; `None` skips the step
    pub target_user: Option<String>,
    pub dry_run: bool,
    pub json: bool,
    pub daemon_wait: DaemonWait,
    pub paths: HostPaths,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            min_version: DEFAULT_MIN_VERSION.to_string(),
            compose_version: DEFAULT_COMPOSE_VERSION.to_string(),
            compose_dir: PathBuf::from(DEFAULT_COMPOSE_DIR),
            target_user: None,
            dry_run: false,
            json: false,
            daemon_wait: DaemonWait::default(),
            paths: HostPaths::default(),
        }
    }
}

impl ProvisionConfig {
    /// Check that version settings are usable.
    pub fn validate(&self) -> Result<()> {
        if DottedVersion::parse(&self.min_version).is_none() {
            return Err(DockerbootError::config(format!(
                "minimum Docker version '{}' is not a dotted version",
                self.min_version
            )));
        }
        if DottedVersion::parse(&self.compose_version).is_none() {
            return Err(DockerbootError::config(format!(
                "compose version '{}' is not a dotted version",
                self.compose_version
            )));
        }
        if !self.compose_dir.is_absolute() {
            return Err(DockerbootError::config(format!(
                "compose plugin directory '{}' must be absolute",
                self.compose_dir.display()
            )));
        }
        Ok(())
    }

    pub fn compose_plugin_path(&self) -> PathBuf {
        self.compose_dir.join("docker-compose")
    }
}

/// Prefix a release tag with `v` if it lacks one.
pub fn normalize_compose_version(version: &str) -> String {
    let trimmed = version.trim();
    if trimmed.starts_with('v') {
        trimmed.to_string()
    } else {
        format!("v{}", trimmed)
    }
}

/// Pick the account that should end up in the `docker` group.
///
/// An explicit value wins, then `SUDO_USER`, `DOAS_USER` and `USER`. Root and
/// empty names resolve to `None`.
pub fn resolve_target_user<F>(explicit: Option<&str>, env: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    explicit
        .map(str::to_string)
        .or_else(|| env("SUDO_USER"))
        .or_else(|| env("DOAS_USER"))
        .or_else(|| env("USER"))
        .map(|user| user.trim().to_string())
        .filter(|user| !user.is_empty() && user != "root")
}
