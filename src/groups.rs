//! `docker` group creation and user membership.

use crate::error::{DockerbootError, Result};
use crate::executor::{CommandSpec, Executor};
use std::collections::BTreeSet;
use std::path::Path;

pub const DOCKER_GROUP: &str = "docker";

/// Result of the membership step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    AlreadyMember,
    Added,
    /// No non-root target user
    Skipped,
}

impl Membership {
    pub fn in_group(self) -> Option<bool> {
        match self {
            Self::AlreadyMember | Self::Added => Some(true),
            Self::Skipped => None,
        }
    }
}

/// Whether `group` exists, via `getent` or `/etc/group` where getent is missing.
pub fn group_exists(exec: &dyn Executor, group: &str) -> bool {
    if exec.command_exists("getent") {
        return exec
            .probe(&CommandSpec::new("getent").args(["group", group]))
            .map(|out| out.success)
            .unwrap_or(false);
    }

    let prefix = format!("{}:", group);
    exec.read_to_string(Path::new("/etc/group"))
        .map(|text| text.lines().any(|line| line.starts_with(&prefix)))
        .unwrap_or(false)
}

/// Create the `docker` group unless it exists.
///
/// Packages normally create it; this covers the manual and already-installed paths.
/// Busybox systems without shadow-utils use `addgroup`.
pub fn ensure_docker_group(exec: &dyn Executor, actions: &mut Vec<String>) -> Result<()> {
    if group_exists(exec, DOCKER_GROUP) {
        return Ok(());
    }

    let cmd = if !exec.command_exists("groupadd") && exec.command_exists("addgroup") {
        CommandSpec::new("addgroup").args(["-S", DOCKER_GROUP])
    } else {
        CommandSpec::new("groupadd").args(["--system", DOCKER_GROUP])
    };
    exec.run(&cmd)?;
    actions.push(format!("Created group {}", DOCKER_GROUP));
    Ok(())
}

/// Group names of `user`, from `id -nG`.
pub fn group_memberships(exec: &dyn Executor, user: &str) -> Result<BTreeSet<String>> {
    let output = exec.probe(&CommandSpec::new("id").args(["-nG", user]))?;
    if !output.success {
        return Err(DockerbootError::user(format!(
            "cannot look up groups of '{}': {}",
            user,
            output.stderr.trim()
        )));
    }
    Ok(parse_group_list(&output.stdout))
}

pub fn parse_group_list(text: &str) -> BTreeSet<String> {
    text.split_whitespace().map(str::to_string).collect()
}

/// Add `user` to the `docker` group unless already a member.
pub fn ensure_membership(
    exec: &dyn Executor,
    user: &str,
    actions: &mut Vec<String>,
) -> Result<Membership> {
    if user == "root" {
        return Ok(Membership::Skipped);
    }

    let groups = group_memberships(exec, user)?;
    if groups.contains(DOCKER_GROUP) {
        tracing::info!("User {} already in group {}", user, DOCKER_GROUP);
        return Ok(Membership::AlreadyMember);
    }

    let cmd = if !exec.command_exists("usermod") && exec.command_exists("addgroup") {
        CommandSpec::new("addgroup").args([user, DOCKER_GROUP])
    } else {
        CommandSpec::new("usermod").args(["-aG", DOCKER_GROUP, user])
    };
    exec.run(&cmd)?;
    actions.push(format!("Added {} to group {}", user, DOCKER_GROUP));
    Ok(Membership::Added)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_group_list() {
        let groups = parse_group_list("alice adm cdrom sudo docker\n");
        assert_eq!(groups.len(), 5);
        assert!(groups.contains("docker"));
        assert!(groups.contains("sudo"));
    }

    #[test]
    fn test_parse_group_list_empty() {
        assert!(parse_group_list("   \n").is_empty());
    }

    #[test]
    fn test_membership_in_group() {
        assert_eq!(Membership::Added.in_group(), Some(true));
        assert_eq!(Membership::AlreadyMember.in_group(), Some(true));
        assert_eq!(Membership::Skipped.in_group(), None);
    }
}
