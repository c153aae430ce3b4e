//! Debian, Ubuntu and Raspbian via Docker's APT repository.

use super::{ProvisionContext, download};
use crate::config::DOCKER_DOWNLOAD_BASE;
use crate::error::{DockerbootError, Result};
use crate::executor::{CommandSpec, Executor, FileChange, write_if_changed};
use crate::host::HostInfo;
use std::path::Path;

const KEYRING_DIR: &str = "/etc/apt/keyrings";
const KEYRING_PATH: &str = "/etc/apt/keyrings/docker.asc";
const SOURCES_PATH: &str = "/etc/apt/sources.list.d/docker.list";

/// Suite used for rolling Debian derivatives (Kali's `kali-rolling`), which
/// Docker's repository does not carry.
const DEBIAN_STABLE_SUITE: &str = "trixie";

const PREREQUISITES: &[&str] = &["ca-certificates", "curl"];

const PACKAGES: &[&str] = &[
    "docker-ce",
    "docker-ce-cli",
    "containerd.io",
    "docker-buildx-plugin",
    "docker-compose-plugin",
];

pub(super) fn install(
    ctx: &ProvisionContext<'_>,
    channel: &str,
    actions: &mut Vec<String>,
) -> Result<()> {
    let exec = ctx.exec;

    // Resolve everything that can fail before touching the host
    let codename = repository_suite(channel, release_codename(exec, ctx.host)?);
    let arch = dpkg_arch(exec, ctx.host);

    apt_get(exec, &["update"])?;
    apt_get(exec, &[&["install", "-y"][..], PREREQUISITES].concat())?;

    exec.create_dir_all(Path::new(KEYRING_DIR), 0o755)?;
    let keyring = Path::new(KEYRING_PATH);
    if !exec.path_exists(keyring) {
        let url = format!("{}/{}/gpg", DOCKER_DOWNLOAD_BASE, channel);
        download(exec, &url, keyring, "0644")?;
        actions.push(format!("Installed Docker signing key to {}", KEYRING_PATH));
    }

    let line = sources_line(channel, &arch, &codename);
    if write_if_changed(exec, Path::new(SOURCES_PATH), &line, 0o644)? == FileChange::Written {
        actions.push(format!("Wrote APT source {} ({})", SOURCES_PATH, codename));
    }

    apt_get(exec, &["update"])?;
    apt_get(exec, &[&["install", "-y"][..], PACKAGES].concat())?;
    actions.push(format!("Installed {} via apt-get", PACKAGES.join(" ")));

    Ok(())
}

/// Source list entry for Docker's repository.
pub(crate) fn sources_line(channel: &str, arch: &str, codename: &str) -> String {
    format!(
        "deb [arch={} signed-by={}] {}/{} {} stable\n",
        arch, KEYRING_PATH, DOCKER_DOWNLOAD_BASE, channel, codename
    )
}

fn apt_get(exec: &dyn Executor, args: &[&str]) -> Result<()> {
    let cmd = CommandSpec::new("apt-get")
        .args(args.iter().copied())
        .env("DEBIAN_FRONTEND", "noninteractive");
    exec.run(&cmd)?;
    Ok(())
}

/// Map a release codename onto a suite Docker publishes for `channel`.
pub(crate) fn repository_suite(channel: &str, codename: String) -> String {
    if channel == "debian" && codename.ends_with("-rolling") {
        tracing::info!(
            "'{}' is a rolling release, using Debian {} packages",
            codename,
            DEBIAN_STABLE_SUITE
        );
        return DEBIAN_STABLE_SUITE.to_string();
    }
    codename
}

fn release_codename(exec: &dyn Executor, host: &HostInfo) -> Result<String> {
    if let Some(codename) = host.os.codename() {
        return Ok(codename.to_string());
    }

    tracing::debug!("os-release has no codename, asking lsb_release");
    exec.probe_text(&CommandSpec::new("lsb_release").arg("-cs"))
        .filter(|c| !c.is_empty())
        .ok_or_else(|| {
            DockerbootError::config(format!(
                "cannot determine the release codename of {}; set VERSION_CODENAME in os-release",
                host.os.display_name()
            ))
        })
}

fn dpkg_arch(exec: &dyn Executor, host: &HostInfo) -> String {
    exec.probe_text(&CommandSpec::new("dpkg").arg("--print-architecture"))
        .filter(|a| !a.is_empty())
        .unwrap_or_else(|| host.arch.debian_name().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sources_line() {
        assert_eq!(
            sources_line("ubuntu", "amd64", "jammy"),
            "deb [arch=amd64 signed-by=/etc/apt/keyrings/docker.asc] \
             https://download.docker.com/linux/ubuntu jammy stable\n"
        );
    }

    #[test]
    fn test_sources_line_raspbian() {
        let line = sources_line("raspbian", "armhf", "bookworm");
        assert!(line.contains("/linux/raspbian bookworm stable"));
        assert!(line.starts_with("deb [arch=armhf "));
    }

    #[test]
    fn test_rolling_debian_derivative_uses_stable_suite() {
        assert_eq!(repository_suite("debian", "kali-rolling".into()), "trixie");
        assert_eq!(repository_suite("debian", "bookworm".into()), "bookworm");
        assert_eq!(repository_suite("ubuntu", "noble".into()), "noble");
    }
}
