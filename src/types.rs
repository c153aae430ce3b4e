//! Host facts as typed values instead of raw strings.

use serde::Serialize;
use std::fmt;
use strum::Display;

/// CPU architecture as reported by `uname -m`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CpuArch {
    X86_64,
    Aarch64,
    Armv7,
    Armv6,
    Ppc64le,
    S390x,
    Riscv64,
    /// Anything else, verbatim
    Other(String),
}

impl CpuArch {
    pub fn from_uname(machine: &str) -> Self {
        match machine.trim() {
            "x86_64" | "amd64" => Self::X86_64,
            "aarch64" | "arm64" => Self::Aarch64,
            "armv7l" | "armv7" | "armhf" => Self::Armv7,
            "armv6l" | "armv6" => Self::Armv6,
            "ppc64le" => Self::Ppc64le,
            "s390x" => Self::S390x,
            "riscv64" => Self::Riscv64,
            other => Self::Other(other.to_string()),
        }
    }

    /// Asset suffix of `docker-compose-linux-<suffix>` on the compose
    /// releases page, or `None` when no build exists.
    pub fn compose_suffix(&self) -> Option<&'static str> {
        match self {
            Self::X86_64 => Some("x86_64"),
            Self::Aarch64 => Some("aarch64"),
            Self::Armv7 => Some("armv7"),
            Self::Armv6 => Some("armv6"),
            Self::Ppc64le => Some("ppc64le"),
            Self::S390x => Some("s390x"),
            Self::Riscv64 => Some("riscv64"),
            Self::Other(_) => None,
        }
    }

    /// Debian architecture name, used when `dpkg` cannot tell us.
    pub fn debian_name(&self) -> &str {
        match self {
            Self::X86_64 => "amd64",
            Self::Aarch64 => "arm64",
            Self::Armv7 | Self::Armv6 => "armhf",
            Self::Ppc64le => "ppc64el",
            Self::S390x => "s390x",
            Self::Riscv64 => "riscv64",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for CpuArch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::X86_64 => write!(f, "x86_64"),
            Self::Aarch64 => write!(f, "aarch64"),
            Self::Armv7 => write!(f, "armv7"),
            Self::Armv6 => write!(f, "armv6"),
            Self::Ppc64le => write!(f, "ppc64le"),
            Self::S390x => write!(f, "s390x"),
            Self::Riscv64 => write!(f, "riscv64"),
            Self::Other(name) => write!(f, "{}", name),
        }
    }
}

/// Service manager that owns the Docker daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum InitSystem {
    Systemd,
    OpenRc,
    Runit,
    /// Plain `service` wrapper (SysV scripts, WSL without systemd)
    SysV,
    Unknown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_uname() {
        assert_eq!(CpuArch::from_uname("x86_64\n"), CpuArch::X86_64);
        assert_eq!(CpuArch::from_uname("arm64"), CpuArch::Aarch64);
        assert_eq!(CpuArch::from_uname("armv7l"), CpuArch::Armv7);
        assert_eq!(CpuArch::from_uname("i686"), CpuArch::Other("i686".to_string()));
    }

    #[test]
    fn test_compose_suffix() {
        assert_eq!(CpuArch::X86_64.compose_suffix(), Some("x86_64"));
        assert_eq!(CpuArch::Armv7.compose_suffix(), Some("armv7"));
        assert_eq!(CpuArch::Other("i686".into()).compose_suffix(), None);
        assert_eq!(CpuArch::Other("mips64".into()).compose_suffix(), None);
    }

    #[test]
    fn test_debian_name() {
        assert_eq!(CpuArch::X86_64.debian_name(), "amd64");
        assert_eq!(CpuArch::Ppc64le.debian_name(), "ppc64el");
        assert_eq!(CpuArch::Armv6.debian_name(), "armhf");
    }

    #[test]
    fn test_init_system_display() {
        assert_eq!(InitSystem::Systemd.to_string(), "systemd");
        assert_eq!(InitSystem::OpenRc.to_string(), "openrc");
        assert_eq!(InitSystem::SysV.to_string(), "sysv");
    }
}
