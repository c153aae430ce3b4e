//! Compose plugin check and manual plugin fallback.
//!
//! Most families get `docker compose` from their packages. When the plugin is
//! still missing afterwards (Amazon Linux, or an old distro engine that
//! already met the minimum), the release binary is dropped into the CLI
//! plugin directory.

use crate::config::COMPOSE_RELEASES_BASE;
use crate::error::{DockerbootError, Result};
use crate::executor::{CommandSpec, Executor};
use crate::installer::{ProvisionContext, download};
use crate::types::CpuArch;
use crate::version::strip_version;

/// Version reported by the compose plugin, without a leading `v`.
pub fn compose_version(exec: &dyn Executor) -> Option<String> {
    if !exec.command_exists("docker") {
        return None;
    }
    exec.probe_text(&CommandSpec::new("docker").args(["compose", "version", "--short"]))
        .map(|raw| strip_version(&raw).to_string())
        .filter(|v| !v.is_empty())
}

/// Release asset URL for `version` on `arch`.
pub fn plugin_url(version: &str, arch: &CpuArch) -> Result<String> {
    let suffix = arch
        .compose_suffix()
        .ok_or_else(|| DockerbootError::unsupported_arch(arch.to_string()))?;
    Ok(format!(
        "{}/{}/docker-compose-linux-{}",
        COMPOSE_RELEASES_BASE, version, suffix
    ))
}

/// Make sure `docker compose` works, installing the plugin binary if needed.
///
/// Returns the plugin version, or `None` in dry-run when nothing could be
/// verified.
pub fn ensure_compose(
    ctx: &ProvisionContext<'_>,
    actions: &mut Vec<String>,
) -> Result<Option<String>> {
    let exec = ctx.exec;

    if let Some(version) = compose_version(exec) {
        tracing::info!("Compose plugin {} present", version);
        return Ok(Some(version));
    }

    let url = plugin_url(&ctx.config.compose_version, &ctx.host.arch)?;
    let dest = ctx.config.compose_plugin_path();

    tracing::info!("Compose plugin missing, installing {} to {}", url, dest.display());
    exec.create_dir_all(&ctx.config.compose_dir, 0o755)?;
    download(exec, &url, &dest, "0755")?;
    actions.push(format!(
        "Installed compose plugin {} to {}",
        ctx.config.compose_version,
        dest.display()
    ));

    if exec.is_dry_run() {
        return Ok(None);
    }

    compose_version(exec).map(Some).ok_or_else(|| {
        DockerbootError::general(format!(
            "compose plugin installed to {} but `docker compose version` still fails",
            dest.display()
        ))
    })
}
