use crate::config::{
    DEFAULT_COMPOSE_DIR, DEFAULT_COMPOSE_VERSION, DEFAULT_MIN_VERSION, ProvisionConfig,
    normalize_compose_version, resolve_target_user,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// dockerboot - install Docker Engine and the Compose plugin on Linux and WSL
#[derive(Parser, Debug)]
#[command(name = "dockerboot")]
#[command(about = "Idempotently install Docker Engine + Compose plugin, start the daemon, \
                   and add your user to the docker group")]
#[command(version)]
pub struct Cli {
    /// Dry-run mode: show what would be executed without making changes.
    ///
    /// Package installs, repository writes, service starts and group changes
    /// are logged and skipped. Read-only checks (docker --version, id -nG)
    /// still run so the plan reflects the real host.
    #[arg(long, global = true, env = "DOCKERBOOT_DRY_RUN")]
    pub dry_run: bool,

    /// Print the final report as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Minimum acceptable Docker Engine version
    #[arg(long, global = true, env = "DOCKER_MIN_VERSION", default_value = DEFAULT_MIN_VERSION)]
    pub min_version: String,

    /// Compose release installed when the plugin is missing
    #[arg(long, global = true, env = "COMPOSE_VERSION", default_value = DEFAULT_COMPOSE_VERSION)]
    pub compose_version: String,

    /// Directory for the manually installed compose plugin
    #[arg(long, global = true, env = "DOCKER_CLI_PLUGINS_DIR", default_value = DEFAULT_COMPOSE_DIR)]
    pub compose_dir: PathBuf,

    /// User to add to the docker group (defaults to the invoking user)
    #[arg(long, global = true, env = "DOCKERBOOT_USER")]
    pub user: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Install and configure Docker (the default)
    Provision,
    /// Report the current state without changing anything
    Status,
    /// Print the detected distribution, family, WSL flag, architecture and init system
    Detect,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn command(&self) -> Commands {
        self.command.unwrap_or(Commands::Provision)
    }

    /// Resolve flags and the invoking environment into a run configuration.
    pub fn to_config(&self) -> ProvisionConfig {
        ProvisionConfig {
            min_version: self.min_version.trim().to_string(),
            compose_version: normalize_compose_version(&self.compose_version),
            compose_dir: self.compose_dir.clone(),
            target_user: resolve_target_user(self.user.as_deref(), |key| std::env::var(key).ok()),
            dry_run: self.dry_run,
            json: self.json,
            ..ProvisionConfig::default()
        }
    }
}
