//! Host environment detection.
//!
//! Gathers the facts the installer branches on: distribution, WSL, CPU
//! architecture and init system. Detection is read-only and never panics;
//! only a missing or empty os-release is an error, since without it no
//! installation routine can be chosen.

use crate::config::HostPaths;
use crate::error::Result;
use crate::executor::{CommandSpec, Executor};
use crate::os_release::OsRelease;
use crate::types::{CpuArch, InitSystem};
use std::fmt;
use std::path::Path;

/// Aggregated detection results.
#[derive(Debug, Clone)]
pub struct HostInfo {
    pub os: OsRelease,
    pub wsl: bool,
    pub arch: CpuArch,
    pub init: InitSystem,
}

impl HostInfo {
    pub fn detect(exec: &dyn Executor, paths: &HostPaths) -> Result<Self> {
        let os = OsRelease::load(exec, &paths.os_release)?;
        let wsl = detect_wsl(exec, paths);
        let arch = detect_arch(exec);
        let init = detect_init_system(exec, wsl);

        tracing::info!(
            "Host detection: os={}, wsl={}, arch={}, init={}",
            os.id,
            wsl,
            arch,
            init
        );

        Ok(Self { os, wsl, arch, init })
    }
}

impl fmt::Display for HostInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "OS: {}, WSL: {}, Arch: {}, Init: {}",
            self.os.display_name(),
            if self.wsl { "yes" } else { "no" },
            self.arch,
            self.init
        )
    }
}

/// True only when the kernel version string carries a Microsoft/WSL marker.
///
/// WSL1 reports e.g. `4.4.0-19041-Microsoft`, WSL2
/// `5.15.146.1-microsoft-standard-WSL2`.
pub fn is_wsl(kernel_release: &str) -> bool {
    let lower = kernel_release.to_ascii_lowercase();
    lower.contains("microsoft") || lower.contains("wsl")
}

/// Read the kernel release, falling back to `/proc/version`.
pub fn detect_wsl(exec: &dyn Executor, paths: &HostPaths) -> bool {
    [&paths.kernel_osrelease, &paths.proc_version]
        .into_iter()
        .find_map(|path| exec.read_to_string(path).ok())
        .map(|text| is_wsl(&text))
        .unwrap_or(false)
}

pub fn detect_arch(exec: &dyn Executor) -> CpuArch {
    match exec.probe_text(&CommandSpec::new("uname").arg("-m")) {
        Some(machine) => CpuArch::from_uname(&machine),
        None => {
            tracing::warn!("uname -m failed, assuming the build architecture");
            CpuArch::from_uname(std::env::consts::ARCH)
        }
    }
}

/// Work out which service manager can start the daemon.
///
/// On WSL, systemd only counts when it is actually running as PID 1; the
/// `/run/systemd/system` marker is checked the same way everywhere.
pub fn detect_init_system(exec: &dyn Executor, wsl: bool) -> InitSystem {
    if exec.path_exists(Path::new("/run/systemd/system")) {
        return InitSystem::Systemd;
    }
    if exec.command_exists("rc-service") {
        return InitSystem::OpenRc;
    }
    if exec.path_exists(Path::new("/etc/runit")) && exec.command_exists("sv") {
        return InitSystem::Runit;
    }
    if exec.command_exists("service") {
        return InitSystem::SysV;
    }
    if wsl {
        tracing::warn!("WSL without systemd or a service wrapper; daemon start may fail");
    }
    InitSystem::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_wsl_markers() {
        assert!(is_wsl("5.15.146.1-microsoft-standard-WSL2"));
        assert!(is_wsl("4.4.0-19041-Microsoft"));
        assert!(is_wsl(
            "Linux version 5.10.16.3-microsoft-standard-WSL2 (oe-user@oe-host)"
        ));
        assert!(is_wsl("6.6.36.3-wsl"));
    }

    #[test]
    fn test_is_wsl_plain_kernels() {
        assert!(!is_wsl("6.8.0-45-generic"));
        assert!(!is_wsl("6.10.10-arch1-1"));
        assert!(!is_wsl("5.14.0-427.el9.x86_64"));
        assert!(!is_wsl(""));
    }
}
