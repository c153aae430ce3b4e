//! Families whose own repositories carry Docker: Arch, Alpine, Void, Gentoo.

use super::ProvisionContext;
use crate::error::Result;
use crate::executor::CommandSpec;

fn install_with(
    ctx: &ProvisionContext<'_>,
    cmd: CommandSpec,
    actions: &mut Vec<String>,
) -> Result<()> {
    let summary = format!("Installed Docker via {}", cmd.program);
    ctx.exec.run(&cmd)?;
    actions.push(summary);
    Ok(())
}

pub(super) fn install_arch(ctx: &ProvisionContext<'_>, actions: &mut Vec<String>) -> Result<()> {
    install_with(
        ctx,
        CommandSpec::new("pacman").args([
            "-S",
            "--needed",
            "--noconfirm",
            "docker",
            "docker-compose",
            "docker-buildx",
        ]),
        actions,
    )
}

pub(super) fn install_alpine(ctx: &ProvisionContext<'_>, actions: &mut Vec<String>) -> Result<()> {
    install_with(
        ctx,
        CommandSpec::new("apk").args(["add", "--no-cache", "docker", "docker-cli-compose"]),
        actions,
    )
}

pub(super) fn install_void(ctx: &ProvisionContext<'_>, actions: &mut Vec<String>) -> Result<()> {
    install_with(
        ctx,
        CommandSpec::new("xbps-install").args(["-Sy", "docker", "docker-compose"]),
        actions,
    )
}

pub(super) fn install_gentoo(ctx: &ProvisionContext<'_>, actions: &mut Vec<String>) -> Result<()> {
    install_with(
        ctx,
        CommandSpec::new("emerge").args([
            "--noreplace",
            "app-containers/docker",
            "app-containers/docker-cli",
            "app-containers/docker-compose",
        ]),
        actions,
    )
}
