//! dockerboot - main entry point
//!
//! Installs Docker Engine + Compose on the running host. Logs go to stderr,
//! the final report to stdout.

use anyhow::Context;
use std::process::ExitCode;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use dockerboot::cli::{Cli, Commands};
use dockerboot::config::ProvisionConfig;
use dockerboot::distro::DistroFamily;
use dockerboot::host::HostInfo;
use dockerboot::status::StatusReport;
use dockerboot::{ProcessGuard, SystemExecutor, installer, process_guard, sanity};

/// Initialize the logger: `info` by default, `RUST_LOG` overrides
fn init_logger() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    init_logger();

    // Stop package managers we spawned if we are interrupted
    if let Err(e) = process_guard::init_signal_handlers() {
        warn!("Failed to initialize signal handlers: {}", e);
    }
    debug!("Signal handlers initialized");

    let cli = Cli::parse_args();
    debug!("CLI arguments parsed: {:?}", cli);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("✗ {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = cli.to_config();
    let exec = SystemExecutor::new(config.dry_run);

    match cli.command() {
        Commands::Provision => {
            let preflight = sanity::run_preflight_checks(&exec)?;
            if !preflight.is_root {
                if config.dry_run {
                    info!("Not running as root; dry-run continues unprivileged");
                } else {
                    let Err(e) = sanity::escalate(&exec, &config);
                    return Err(e.into());
                }
            }

            let guard = ProcessGuard::new();
            info!("dockerboot starting{}", if config.dry_run { " (dry-run)" } else { "" });
            let report = installer::provision(&exec, &config).context("provisioning failed")?;
            debug!("{} child process(es) still tracked", guard.child_count());
            print_report(&report, &config)?;
        }
        Commands::Status => {
            let report = installer::inspect(&exec, &config).context("status check failed")?;
            print_report(&report, &config)?;
        }
        Commands::Detect => {
            let host = HostInfo::detect(&exec, &config.paths).context("host detection failed")?;
            print_detection(&host, &config)?;
        }
    }

    Ok(())
}

fn print_report(report: &StatusReport, config: &ProvisionConfig) -> anyhow::Result<()> {
    if config.json {
        println!("{}", report.to_json()?);
    } else {
        print!("{}", report);
    }
    Ok(())
}

fn print_detection(host: &HostInfo, config: &ProvisionConfig) -> anyhow::Result<()> {
    let family = DistroFamily::resolve(&host.os);

    if config.json {
        let value = serde_json::json!({
            "id": host.os.id,
            "id_like": host.os.id_like,
            "pretty_name": host.os.display_name(),
            "version_id": host.os.version_id,
            "codename": host.os.codename(),
            "family": family.as_ref().ok(),
            "wsl": host.wsl,
            "arch": host.arch.to_string(),
            "init": host.init,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("{}", host);
    match family {
        Ok(family) => println!("Family: {}", family),
        Err(e) => println!("Family: unsupported ({})", e),
    }
    Ok(())
}
