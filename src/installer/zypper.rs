//! openSUSE and SLES via zypper.

use super::ProvisionContext;
use crate::config::DOCKER_DOWNLOAD_BASE;
use crate::error::Result;
use crate::executor::{CommandSpec, Executor};

const SLES_PACKAGES: &[&str] = &[
    "docker-ce",
    "docker-ce-cli",
    "containerd.io",
    "docker-compose-plugin",
];

fn zypper(args: &[&str]) -> CommandSpec {
    CommandSpec::new("zypper")
        .arg("--non-interactive")
        .args(args.iter().copied())
}

/// openSUSE carries both the engine and the v2 compose plugin in its main repos.
pub(super) fn install_opensuse(
    ctx: &ProvisionContext<'_>,
    actions: &mut Vec<String>,
) -> Result<()> {
    ctx.exec.run(&zypper(&["install", "docker", "docker-compose"]))?;
    actions.push("Installed docker docker-compose via zypper".to_string());
    Ok(())
}

pub(super) fn install_sles(
    ctx: &ProvisionContext<'_>,
    channel: &str,
    actions: &mut Vec<String>,
) -> Result<()> {
    let exec = ctx.exec;

    if has_docker_repo(exec) {
        tracing::debug!("zypper already lists a docker-ce repository");
    } else {
        let url = format!("{}/{}/docker-ce.repo", DOCKER_DOWNLOAD_BASE, channel);
        exec.run(&zypper(&["addrepo", url.as_str()]))?;
        actions.push(format!("Added zypper repository {}", url));
    }

    exec.run(&zypper(&["--gpg-auto-import-keys", "refresh"]))?;
    exec.run(&zypper(&[&["install"][..], SLES_PACKAGES].concat()))?;
    actions.push(format!("Installed {} via zypper", SLES_PACKAGES.join(" ")));
    Ok(())
}

fn has_docker_repo(exec: &dyn Executor) -> bool {
    exec.probe_text(&zypper(&["repos"]))
        .is_some_and(|listing| listing.contains("docker-ce"))
}
