//! Installation orchestration.
//!
//! `provision` runs the whole bootstrap top to bottom:
//! detect → select family → install (unless already satisfied) → compose →
//! daemon → group membership → report. `inspect` gathers the same report
//! without changing anything.

mod apt;
mod native;
mod rpm;
mod zypper;

use crate::compose;
use crate::config::ProvisionConfig;
use crate::distro::DistroFamily;
use crate::error::{DockerbootError, Result};
use crate::executor::{CommandSpec, Executor};
use crate::groups::{self, Membership};
use crate::host::HostInfo;
use crate::service;
use crate::status::StatusReport;
use crate::version::{parse_docker_version, version_ge};
use std::path::Path;
use tracing::{info, warn};

/// Everything a step needs, borrowed for the duration of one run.
pub struct ProvisionContext<'a> {
    pub exec: &'a dyn Executor,
    pub host: &'a HostInfo,
    pub config: &'a ProvisionConfig,
}

/// Provision Docker Engine + Compose on this host.
pub fn provision(exec: &dyn Executor, config: &ProvisionConfig) -> Result<StatusReport> {
    config.validate()?;

    let host = HostInfo::detect(exec, &config.paths)?;
    let family = DistroFamily::resolve(&host.os)?;
    let ctx = ProvisionContext {
        exec,
        host: &host,
        config,
    };
    let mut actions = Vec::new();
    let mut hints = Vec::new();

    info!("Selected {} installation routine for {}", family, host.os.display_name());

    let installed = installed_docker_version(exec);
    let already_satisfied = match installed.as_deref() {
        Some(version) if version_ge(version, &config.min_version) => {
            info!(
                "Docker {} already satisfies minimum {}, skipping package installation",
                version, config.min_version
            );
            true
        }
        Some(version) => {
            warn!(
                "Docker {} is older than required {}, upgrading",
                version, config.min_version
            );
            false
        }
        None => false,
    };

    if !already_satisfied {
        install_packages(&ctx, family, &mut actions)?;
        verify_engine(&ctx)?;
    }

    let compose_version = compose::ensure_compose(&ctx, &mut actions)?;
    let daemon_running = service::ensure_daemon(&ctx, &mut actions, &mut hints)?;

    groups::ensure_docker_group(exec, &mut actions)?;
    let membership = match &config.target_user {
        Some(user) => groups::ensure_membership(exec, user, &mut actions)?,
        None => Membership::Skipped,
    };
    if membership == Membership::Added {
        hints.push(
            "Log out and back in (or run `newgrp docker`) for the docker group to take effect"
                .to_string(),
        );
    }

    Ok(StatusReport {
        os: host.os.display_name().to_string(),
        family: Some(family),
        wsl: host.wsl,
        arch: host.arch.to_string(),
        init: host.init,
        docker_version: installed_docker_version(exec).or(installed),
        min_version: config.min_version.clone(),
        compose_version,
        legacy_compose: exec.command_exists("docker-compose"),
        daemon_running,
        user: config.target_user.clone(),
        user_in_docker_group: membership.in_group(),
        already_satisfied,
        dry_run: exec.is_dry_run(),
        actions,
        hints,
    })
}

/// Report the current state without changing the host.
///
/// An unsupported distribution is reported (family `None`) rather than
/// treated as an error.
pub fn inspect(exec: &dyn Executor, config: &ProvisionConfig) -> Result<StatusReport> {
    let host = HostInfo::detect(exec, &config.paths)?;
    let family = DistroFamily::resolve(&host.os).ok();
    let docker_version = installed_docker_version(exec);
    let already_satisfied = docker_version
        .as_deref()
        .is_some_and(|v| version_ge(v, &config.min_version));

    let user_in_docker_group = match &config.target_user {
        Some(user) => groups::group_memberships(exec, user)
            .ok()
            .map(|set| set.contains(groups::DOCKER_GROUP)),
        None => None,
    };

    let mut hints = Vec::new();
    if family.is_none() {
        hints.push(format!(
            "'{}' is not a supported distribution; supported families: {}",
            host.os.id,
            DistroFamily::supported_list()
        ));
    }

    Ok(StatusReport {
        os: host.os.display_name().to_string(),
        family,
        wsl: host.wsl,
        arch: host.arch.to_string(),
        init: host.init,
        docker_version,
        min_version: config.min_version.clone(),
        compose_version: compose::compose_version(exec),
        legacy_compose: exec.command_exists("docker-compose"),
        daemon_running: service::daemon_running(exec),
        user: config.target_user.clone(),
        user_in_docker_group,
        already_satisfied,
        dry_run: exec.is_dry_run(),
        actions: Vec::new(),
        hints,
    })
}

/// Engine version from `docker --version`, if a real Docker CLI is installed.
pub fn installed_docker_version(exec: &dyn Executor) -> Option<String> {
    if !exec.command_exists("docker") {
        return None;
    }
    let output = exec.probe_text(&CommandSpec::new("docker").arg("--version"))?;
    let version = parse_docker_version(&output);
    if version.is_none() {
        warn!("`docker --version` did not report a Docker engine: {}", output);
    }
    version
}

fn install_packages(
    ctx: &ProvisionContext<'_>,
    family: DistroFamily,
    actions: &mut Vec<String>,
) -> Result<()> {
    match family {
        DistroFamily::Debian | DistroFamily::Ubuntu | DistroFamily::Raspbian => {
            apt::install(ctx, upstream_channel(ctx, family)?, actions)
        }
        DistroFamily::Fedora | DistroFamily::RhelCompat => {
            rpm::install_upstream(ctx, upstream_channel(ctx, family)?, actions)
        }
        DistroFamily::Sles => zypper::install_sles(ctx, upstream_channel(ctx, family)?, actions),
        DistroFamily::AmazonLinux => rpm::install_amazon(ctx, actions),
        DistroFamily::OpenSuse => zypper::install_opensuse(ctx, actions),
        DistroFamily::Arch => native::install_arch(ctx, actions),
        DistroFamily::Alpine => native::install_alpine(ctx, actions),
        DistroFamily::Void => native::install_void(ctx, actions),
        DistroFamily::Gentoo => native::install_gentoo(ctx, actions),
    }
}

fn upstream_channel(ctx: &ProvisionContext<'_>, family: DistroFamily) -> Result<&'static str> {
    family.docker_repo_channel(&ctx.host.os).ok_or_else(|| {
        DockerbootError::general(format!("{} has no upstream Docker repository", family))
    })
}

fn verify_engine(ctx: &ProvisionContext<'_>) -> Result<()> {
    if ctx.exec.is_dry_run() {
        return Ok(());
    }
    match installed_docker_version(ctx.exec) {
        Some(version) => {
            if !version_ge(&version, &ctx.config.min_version) {
                warn!(
                    "Installed Docker {} is still older than {}; the distribution does not ship a newer engine",
                    version, ctx.config.min_version
                );
            }
            Ok(())
        }
        None => Err(DockerbootError::general(
            "package installation finished but `docker` is still not available",
        )),
    }
}

/// Fetch `url` to `dest` with curl and set its mode.
pub(crate) fn download(
    exec: &dyn Executor,
    url: &str,
    dest: &Path,
    mode: &str,
) -> Result<()> {
    if !exec.is_dry_run() && !exec.command_exists("curl") {
        return Err(DockerbootError::config(format!(
            "curl is required to download {}",
            url
        )));
    }

    let dest = dest.display().to_string();
    exec.run(&CommandSpec::new("curl").args(["-fsSL", url, "-o", dest.as_str()]))?;
    exec.run(&CommandSpec::new("chmod").args([mode, dest.as_str()]))?;
    Ok(())
}
