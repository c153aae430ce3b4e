//! Scripted host for integration tests
//!
//! `FakeExecutor` answers probes from a table keyed by the rendered command
//! line, records every mutating command, and keeps files in memory. Runs can
//! carry effects (a command appears, a probe starts answering) so a scenario
//! can model "docker is present after the package install".

#![allow(dead_code)]

use dockerboot::config::{DaemonWait, ProvisionConfig};
use dockerboot::error::{DockerbootError, Result};
use dockerboot::executor::{CommandOutput, CommandSpec, Executor};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const UBUNTU_JAMMY: &str = r#"PRETTY_NAME="Ubuntu 22.04.4 LTS"
NAME="Ubuntu"
VERSION_ID="22.04"
VERSION="22.04.4 LTS (Jammy Jellyfish)"
VERSION_CODENAME=jammy
ID=ubuntu
ID_LIKE=debian
UBUNTU_CODENAME=jammy
"#;

pub const MINT_21: &str = r#"NAME="Linux Mint"
VERSION="21.3 (Virginia)"
ID=linuxmint
ID_LIKE="ubuntu debian"
PRETTY_NAME="Linux Mint 21.3"
VERSION_ID="21.3"
VERSION_CODENAME=virginia
UBUNTU_CODENAME=jammy
"#;

pub const AMAZON_2023: &str = r#"NAME="Amazon Linux"
VERSION="2023"
ID="amzn"
ID_LIKE="fedora"
VERSION_ID="2023"
PRETTY_NAME="Amazon Linux 2023.5.20240805"
"#;

pub const ALPINE_320: &str = r#"NAME="Alpine Linux"
ID=alpine
VERSION_ID=3.20.2
PRETTY_NAME="Alpine Linux v3.20"
"#;

pub const SLES_15: &str = r#"NAME="SLES"
VERSION="15-SP5"
VERSION_ID="15.5"
PRETTY_NAME="SUSE Linux Enterprise Server 15 SP5"
ID="sles"
ID_LIKE="suse"
"#;

pub const KALI: &str = r#"PRETTY_NAME="Kali GNU/Linux Rolling"
NAME="Kali GNU/Linux"
VERSION_ID="2024.2"
VERSION="2024.2"
VERSION_CODENAME=kali-rolling
ID=kali
ID_LIKE=debian
"#;

pub const FEDORA_40: &str = r#"NAME="Fedora Linux"
VERSION="40 (Server Edition)"
ID=fedora
VERSION_ID=40
PRETTY_NAME="Fedora Linux 40 (Server Edition)"
"#;

pub const ROCKY_9: &str = r#"NAME="Rocky Linux"
VERSION="9.4 (Blue Onyx)"
ID="rocky"
ID_LIKE="rhel centos fedora"
VERSION_ID="9.4"
PRETTY_NAME="Rocky Linux 9.4 (Blue Onyx)"
"#;

pub const RHEL_9: &str = r#"NAME="Red Hat Enterprise Linux"
VERSION="9.4 (Plow)"
ID="rhel"
ID_LIKE="fedora"
VERSION_ID="9.4"
PRETTY_NAME="Red Hat Enterprise Linux 9.4 (Plow)"
"#;

pub const OPENSUSE_TUMBLEWEED: &str = r#"NAME="openSUSE Tumbleweed"
ID="opensuse-tumbleweed"
ID_LIKE="opensuse suse"
VERSION_ID="20240801"
PRETTY_NAME="openSUSE Tumbleweed"
"#;

pub const ARCH: &str = r#"NAME="Arch Linux"
PRETTY_NAME="Arch Linux"
ID=arch
BUILD_ID=rolling
"#;

pub const GENTOO: &str = r#"NAME=Gentoo
ID=gentoo
PRETTY_NAME="Gentoo Linux"
VERSION_ID="2.15"
"#;

pub const VOID: &str = r#"NAME="Void"
ID="void"
PRETTY_NAME="Void Linux"
"#;

pub const HAIKU: &str = r#"NAME=Haiku
ID=haiku
PRETTY_NAME="Haiku R1/beta4"
"#;

pub const PLAIN_KERNEL: &str = "6.8.0-45-generic\n";
pub const WSL2_KERNEL: &str = "5.15.146.1-microsoft-standard-WSL2\n";

pub const DOCKER_VERSION_OUTPUT: &str = "Docker version 24.0.7, build afdd53b";

/// Something that becomes true once a matching command has run.
#[derive(Debug, Clone)]
pub enum Effect {
    /// Program appears on PATH
    Command(String),
    /// Probe starts returning this output
    Probe(String, CommandOutput),
    /// File appears
    Path(PathBuf),
}

#[derive(Default)]
pub struct FakeExecutor {
    dry_run: bool,
    commands: RefCell<HashSet<String>>,
    paths: RefCell<HashSet<PathBuf>>,
    files: RefCell<HashMap<PathBuf, String>>,
    probes: RefCell<HashMap<String, CommandOutput>>,
    failing: HashSet<String>,
    effects: Vec<(String, Effect)>,
    runs: RefCell<Vec<String>>,
    writes: RefCell<Vec<PathBuf>>,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    pub fn with_commands(self, programs: &[&str]) -> Self {
        self.commands
            .borrow_mut()
            .extend(programs.iter().map(|p| p.to_string()));
        self
    }

    pub fn with_path(self, path: &str) -> Self {
        self.paths.borrow_mut().insert(PathBuf::from(path));
        self
    }

    pub fn with_file(self, path: &str, contents: &str) -> Self {
        self.files
            .borrow_mut()
            .insert(PathBuf::from(path), contents.to_string());
        self
    }

    /// Host identity: os-release plus kernel release.
    pub fn with_os(self, os_release: &str, kernel: &str) -> Self {
        self.with_file("/etc/os-release", os_release)
            .with_file("/proc/sys/kernel/osrelease", kernel)
    }

    pub fn with_probe(self, command: &str, stdout: &str) -> Self {
        self.probes
            .borrow_mut()
            .insert(command.to_string(), CommandOutput::ok(stdout));
        self
    }

    /// Mutating commands whose rendered line contains `needle` fail.
    pub fn failing(mut self, needle: &str) -> Self {
        self.failing.insert(needle.to_string());
        self
    }

    /// Apply `effect` once a command whose rendered line contains `needle` runs.
    pub fn after(mut self, needle: &str, effect: Effect) -> Self {
        self.effects.push((needle.to_string(), effect));
        self
    }

    /// A host where the docker CLI answers with a current engine.
    pub fn with_docker_installed(self) -> Self {
        self.with_commands(&["docker"])
            .with_probe("docker --version", DOCKER_VERSION_OUTPUT)
            .with_probe("docker compose version --short", "2.24.5")
    }

    /// A package install that brings the engine, the compose plugin and the
    /// docker group with it.
    pub fn installs_docker_on(self, needle: &str) -> Self {
        self.after(needle, Effect::Command("docker".into()))
            .after(
                needle,
                Effect::Probe("docker --version".into(), probe_ok(DOCKER_VERSION_OUTPUT)),
            )
            .after(
                needle,
                Effect::Probe("docker compose version --short".into(), probe_ok("2.29.7")),
            )
            .after(
                needle,
                Effect::Probe("getent group docker".into(), probe_ok("docker:x:980:")),
            )
    }

    /// How many recorded commands contain `needle`.
    pub fn ran_count(&self, needle: &str) -> usize {
        self.runs
            .borrow()
            .iter()
            .filter(|line| line.contains(needle))
            .count()
    }

    pub fn runs(&self) -> Vec<String> {
        self.runs.borrow().clone()
    }

    pub fn ran(&self, needle: &str) -> bool {
        self.runs.borrow().iter().any(|line| line.contains(needle))
    }

    pub fn written(&self) -> Vec<PathBuf> {
        self.writes.borrow().clone()
    }

    pub fn file(&self, path: &str) -> Option<String> {
        self.files.borrow().get(Path::new(path)).cloned()
    }

    fn apply(&self, effect: &Effect) {
        match effect {
            Effect::Command(program) => {
                self.commands.borrow_mut().insert(program.clone());
            }
            Effect::Probe(command, output) => {
                self.probes
                    .borrow_mut()
                    .insert(command.clone(), output.clone());
            }
            Effect::Path(path) => {
                self.paths.borrow_mut().insert(path.clone());
            }
        }
    }
}

impl Executor for FakeExecutor {
    fn probe(&self, cmd: &CommandSpec) -> Result<CommandOutput> {
        let line = cmd.to_string();
        Ok(self
            .probes
            .borrow()
            .get(&line)
            .cloned()
            .unwrap_or_else(|| CommandOutput::failed(1, format!("unscripted probe: {}", line))))
    }

    fn run(&self, cmd: &CommandSpec) -> Result<CommandOutput> {
        let line = cmd.to_string();
        self.runs.borrow_mut().push(line.clone());

        if self.dry_run {
            return Ok(CommandOutput::ok(""));
        }
        if self.failing.iter().any(|needle| line.contains(needle.as_str())) {
            return Err(DockerbootError::command(line, 1, "scripted failure"));
        }
        for (needle, effect) in &self.effects {
            if line.contains(needle.as_str()) {
                self.apply(effect);
            }
        }
        Ok(CommandOutput::ok(""))
    }

    fn command_exists(&self, program: &str) -> bool {
        self.commands.borrow().contains(program)
    }

    fn path_exists(&self, path: &Path) -> bool {
        self.paths.borrow().contains(path) || self.files.borrow().contains_key(path)
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        self.files.borrow().get(path).cloned().ok_or_else(|| {
            DockerbootError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} not found", path.display()),
            ))
        })
    }

    fn write_file(&self, path: &Path, contents: &str, _mode: u32) -> Result<()> {
        if self.dry_run {
            return Ok(());
        }
        self.writes.borrow_mut().push(path.to_path_buf());
        self.files
            .borrow_mut()
            .insert(path.to_path_buf(), contents.to_string());
        Ok(())
    }

    fn create_dir_all(&self, path: &Path, _mode: u32) -> Result<()> {
        if !self.dry_run {
            self.paths.borrow_mut().insert(path.to_path_buf());
        }
        Ok(())
    }

    fn is_dry_run(&self) -> bool {
        self.dry_run
    }
}

/// Config for tests: target user `alice`, no waiting between daemon checks.
pub fn test_config() -> ProvisionConfig {
    ProvisionConfig {
        target_user: Some("alice".to_string()),
        daemon_wait: DaemonWait {
            attempts: 3,
            interval: Duration::ZERO,
        },
        ..ProvisionConfig::default()
    }
}

pub fn probe_ok(stdout: &str) -> CommandOutput {
    CommandOutput::ok(stdout)
}
