//! Docker daemon startup.

use crate::error::{DockerbootError, Result};
use crate::executor::{CommandSpec, Executor};
use crate::installer::ProvisionContext;
use crate::types::InitSystem;
use std::path::Path;

/// Whether the daemon answers `docker info`.
pub fn daemon_running(exec: &dyn Executor) -> bool {
    if !exec.command_exists("docker") {
        return false;
    }
    exec.probe(&CommandSpec::new("docker").args(["info", "--format", "{{.ServerVersion}}"]))
        .map(|out| out.success)
        .unwrap_or(false)
}

/// Start the daemon if it is not already running, then wait until it answers.
///
/// Returns whether the daemon is known to be running; in dry-run a daemon
/// that would have been started is reported as not running.
pub fn ensure_daemon(
    ctx: &ProvisionContext<'_>,
    actions: &mut Vec<String>,
    hints: &mut Vec<String>,
) -> Result<bool> {
    let exec = ctx.exec;
    let init = ctx.host.init;

    if ctx.host.wsl && init != InitSystem::Systemd {
        hints.push(
            "WSL without systemd: the Docker daemon will not start on boot. Add `[boot] systemd=true` \
             to /etc/wsl.conf, or rerun `sudo service docker start` after each WSL restart"
                .to_string(),
        );
    }

    if daemon_running(exec) {
        tracing::info!("Docker daemon already running");
        if init == InitSystem::Systemd {
            enable_on_boot(exec, actions)?;
        }
        return Ok(true);
    }

    start(exec, init, ctx.host.wsl)?;
    actions.push(format!("Started Docker daemon via {}", init));

    if exec.is_dry_run() {
        return Ok(false);
    }

    let wait = ctx.config.daemon_wait;
    for attempt in 1..=wait.attempts {
        if daemon_running(exec) {
            tracing::info!("Docker daemon ready after {} check(s)", attempt);
            return Ok(true);
        }
        std::thread::sleep(wait.interval);
    }

    Err(DockerbootError::service(format!(
        "daemon did not respond to `docker info` after {} checks",
        wait.attempts
    )))
}

fn start(exec: &dyn Executor, init: InitSystem, wsl: bool) -> Result<()> {
    match init {
        InitSystem::Systemd => {
            exec.run(&CommandSpec::new("systemctl").args(["enable", "--now", "docker.service"]))?;
        }
        InitSystem::OpenRc => {
            exec.run_non_fatal(&CommandSpec::new("rc-update").args(["add", "docker", "default"]));
            exec.run(&CommandSpec::new("rc-service").args(["docker", "start"]))?;
        }
        InitSystem::Runit => {
            if !exec.path_exists(Path::new("/var/service/docker")) {
                exec.run(&CommandSpec::new("ln").args(["-s", "/etc/sv/docker", "/var/service/"]))?;
            }
            exec.run_non_fatal(&CommandSpec::new("sv").args(["up", "docker"]));
        }
        InitSystem::SysV => {
            exec.run(&CommandSpec::new("service").args(["docker", "start"]))?;
        }
        InitSystem::Unknown if wsl => {
            // Minimal WSL images lack even the service wrapper; the init script still works
            exec.run(&CommandSpec::new("/etc/init.d/docker").arg("start"))?;
        }
        InitSystem::Unknown => {
            return Err(DockerbootError::service(
                "no supported init system found (systemd, OpenRC, runit or service)",
            ));
        }
    }
    Ok(())
}

fn enable_on_boot(exec: &dyn Executor, actions: &mut Vec<String>) -> Result<()> {
    let enabled = exec
        .probe(&CommandSpec::new("systemctl").args(["is-enabled", "--quiet", "docker.service"]))
        .map(|out| out.success)
        .unwrap_or(false);

    if !enabled {
        exec.run(&CommandSpec::new("systemctl").args(["enable", "docker.service"]))?;
        actions.push("Enabled docker.service at boot".to_string());
    }
    Ok(())
}
