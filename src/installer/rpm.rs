//! Fedora, RHEL-compatible and Amazon Linux via dnf (or yum).

use super::{ProvisionContext, download};
use crate::config::DOCKER_DOWNLOAD_BASE;
use crate::error::Result;
use crate::executor::{CommandSpec, Executor};
use std::path::Path;

const REPO_DIR: &str = "/etc/yum.repos.d";
const REPO_PATH: &str = "/etc/yum.repos.d/docker-ce.repo";

const PACKAGES: &[&str] = &[
    "docker-ce",
    "docker-ce-cli",
    "containerd.io",
    "docker-buildx-plugin",
    "docker-compose-plugin",
];

/// `dnf` where available (Fedora, EL8+, AL2023), `yum` otherwise (EL7, AL2).
fn package_manager(exec: &dyn Executor) -> &'static str {
    if exec.command_exists("dnf") { "dnf" } else { "yum" }
}

fn pm_install(exec: &dyn Executor, pm: &str, packages: &[&str]) -> Result<()> {
    exec.run(
        &CommandSpec::new(pm)
            .args(["install", "-y"])
            .args(packages.iter().copied()),
    )?;
    Ok(())
}

pub(super) fn install_upstream(
    ctx: &ProvisionContext<'_>,
    channel: &str,
    actions: &mut Vec<String>,
) -> Result<()> {
    let exec = ctx.exec;
    let pm = package_manager(exec);

    let repo = Path::new(REPO_PATH);
    if exec.path_exists(repo) {
        tracing::debug!("{} already present", REPO_PATH);
    } else {
        exec.create_dir_all(Path::new(REPO_DIR), 0o755)?;
        let url = format!("{}/{}/docker-ce.repo", DOCKER_DOWNLOAD_BASE, channel);
        download(exec, &url, repo, "0644")?;
        actions.push(format!("Added Docker repository {} ({})", REPO_PATH, channel));
    }

    pm_install(exec, pm, PACKAGES)?;
    actions.push(format!("Installed {} via {}", PACKAGES.join(" "), pm));
    Ok(())
}

/// Amazon Linux ships its own engine package and no compose plugin; the
/// plugin comes from the manual download afterwards.
pub(super) fn install_amazon(ctx: &ProvisionContext<'_>, actions: &mut Vec<String>) -> Result<()> {
    let pm = package_manager(ctx.exec);
    pm_install(ctx.exec, pm, &["docker"])?;
    actions.push(format!("Installed docker via {}", pm));
    Ok(())
}
