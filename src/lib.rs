//! dockerboot library
//!
//! Provisions Docker Engine and the Compose plugin on Linux and WSL hosts:
//! detect the distribution, pick its installation routine, install the
//! compose plugin, start the daemon and add the invoking user to the
//! `docker` group. Every step is idempotent.

pub mod cli;
pub mod compose;
pub mod config;
pub mod distro;
pub mod error;
pub mod executor;
pub mod groups;
pub mod host;
pub mod installer;
pub mod os_release;
pub mod process_guard;
pub mod sanity;
pub mod service;
pub mod status;
pub mod types;
pub mod version;

// Re-export main types for convenience
pub use config::{DaemonWait, HostPaths, ProvisionConfig};
pub use distro::DistroFamily;
pub use error::{DockerbootError, Result};
pub use executor::{CommandOutput, CommandSpec, Executor, FileChange, SystemExecutor};
pub use host::HostInfo;
pub use installer::{inspect, provision};
pub use os_release::OsRelease;
pub use process_guard::{ChildRegistry, CommandProcessGroup, ProcessGuard};
pub use status::StatusReport;
pub use types::{CpuArch, InitSystem};
pub use version::{DottedVersion, version_ge};
