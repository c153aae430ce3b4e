//! Final status report.

use crate::distro::DistroFamily;
use crate::error::Result;
use crate::types::InitSystem;
use serde::Serialize;
use std::fmt;

/// What the host looks like at the end of a run.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub os: String,
    /// `None` when the distribution is not supported (status only)
    pub family: Option<DistroFamily>,
    pub wsl: bool,
    pub arch: String,
    pub init: InitSystem,
    pub docker_version: Option<String>,
    pub min_version: String,
    pub compose_version: Option<String>,
    /// Standalone v1-style `docker-compose` binary on PATH
    pub legacy_compose: bool,
    pub daemon_running: bool,
    pub user: Option<String>,
    pub user_in_docker_group: Option<bool>,
    /// Docker already met the minimum version; no packages were installed
    pub already_satisfied: bool,
    pub dry_run: bool,
    pub actions: Vec<String>,
    pub hints: Vec<String>,
}

impl StatusReport {
    /// Engine, compose plugin and daemon are all in place.
    pub fn is_healthy(&self) -> bool {
        self.docker_version.is_some() && self.compose_version.is_some() && self.daemon_running
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn mark(ok: bool) -> &'static str {
    if ok { "✓" } else { "✗" }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let family = self
            .family
            .map(|fam| fam.to_string())
            .unwrap_or_else(|| "unsupported".to_string());
        writeln!(f, "Host:    {} [{}]", self.os, family)?;
        writeln!(
            f,
            "         arch {}, init {}{}",
            self.arch,
            self.init,
            if self.wsl { ", WSL" } else { "" }
        )?;

        match &self.docker_version {
            Some(version) if self.already_satisfied => writeln!(
                f,
                "{} Docker Engine {} (already satisfies >= {})",
                mark(true),
                version,
                self.min_version
            )?,
            Some(version) => writeln!(f, "{} Docker Engine {}", mark(true), version)?,
            None => writeln!(f, "{} Docker Engine not installed", mark(false))?,
        }

        match &self.compose_version {
            Some(version) => writeln!(f, "{} Compose plugin {}", mark(true), version)?,
            None => writeln!(f, "{} Compose plugin not available", mark(false))?,
        }
        if self.legacy_compose {
            writeln!(f, "  note: legacy standalone docker-compose is also on PATH")?;
        }

        writeln!(
            f,
            "{} Docker daemon {}",
            mark(self.daemon_running),
            if self.daemon_running { "running" } else { "not running" }
        )?;

        match (&self.user, self.user_in_docker_group) {
            (Some(user), Some(true)) => writeln!(f, "{} User {} in docker group", mark(true), user)?,
            (Some(user), _) => writeln!(f, "{} User {} not in docker group", mark(false), user)?,
            (None, _) => writeln!(f, "- No non-root user to add to the docker group")?,
        }

        if !self.actions.is_empty() {
            writeln!(
                f,
                "\n{}",
                if self.dry_run { "Planned changes (dry-run):" } else { "Changes made:" }
            )?;
            for action in &self.actions {
                writeln!(f, "  • {}", action)?;
            }
        } else if self.already_satisfied {
            writeln!(f, "\nNothing to do: host already provisioned.")?;
        }

        for hint in &self.hints {
            writeln!(f, "\nhint: {}", hint)?;
        }

        Ok(())
    }
}
