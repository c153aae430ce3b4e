//! Distribution family selection.
//!
//! `ID` is tried first, then each `ID_LIKE` entry in file order. The first
//! match picks the installation routine, so exactly one routine runs.

use crate::error::{DockerbootError, Result};
use crate::os_release::OsRelease;
use serde::Serialize;
use strum::{Display, EnumIter, IntoEnumIterator};

/// A cluster of distributions sharing a package manager and repository format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[derive(Display, EnumIter)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum DistroFamily {
    Debian,
    Ubuntu,
    Raspbian,
    Fedora,
    /// CentOS, Rocky, AlmaLinux, Oracle Linux, RHEL
    RhelCompat,
    AmazonLinux,
    OpenSuse,
    Sles,
    /// Arch and its derivatives
    Arch,
    Alpine,
    Void,
    Gentoo,
}

impl DistroFamily {
    /// Map a single os-release identifier to its family.
    pub fn from_id(id: &str) -> Option<Self> {
        let family = match id.to_ascii_lowercase().as_str() {
            "debian" | "kali" | "devuan" | "mx" => Self::Debian,
            "ubuntu" | "linuxmint" | "pop" | "elementary" | "zorin" | "neon" => Self::Ubuntu,
            "raspbian" => Self::Raspbian,
            "fedora" | "nobara" => Self::Fedora,
            "rhel" | "centos" | "rocky" | "almalinux" | "ol" | "circle" => Self::RhelCompat,
            "amzn" => Self::AmazonLinux,
            "opensuse" | "opensuse-leap" | "opensuse-tumbleweed" | "opensuse-slowroll"
            | "suse" => Self::OpenSuse,
            "sles" | "sled" | "sles_sap" => Self::Sles,
            "arch" | "archarm" | "manjaro" | "endeavouros" | "cachyos" | "garuda" | "artix" => {
                Self::Arch
            }
            "alpine" | "postmarketos" => Self::Alpine,
            "void" => Self::Void,
            "gentoo" => Self::Gentoo,
            _ => return None,
        };
        Some(family)
    }

    /// Select the family for this host, or fail with a diagnostic.
    pub fn resolve(os: &OsRelease) -> Result<Self> {
        if let Some(family) = Self::from_id(&os.id) {
            tracing::debug!("Distribution '{}' matched family {}", os.id, family);
            return Ok(family);
        }

        for like in &os.id_like {
            if let Some(family) = Self::from_id(like) {
                tracing::info!(
                    "Distribution '{}' not recognized, using ID_LIKE '{}' ({})",
                    os.id,
                    like,
                    family
                );
                return Ok(family);
            }
        }

        Err(DockerbootError::UnsupportedDistro {
            id: os.id.clone(),
            id_like: os.id_like_joined(),
            supported: Self::supported_list(),
        })
    }

    pub fn supported_list() -> String {
        Self::iter().map(|f| f.to_string()).collect::<Vec<_>>().join(", ")
    }

    /// Path segment under `https://download.docker.com/linux/` for the
    /// upstream repository, if the family uses one.
    pub fn docker_repo_channel(self, os: &OsRelease) -> Option<&'static str> {
        match self {
            Self::Debian => Some("debian"),
            Self::Ubuntu => Some("ubuntu"),
            Self::Raspbian => Some("raspbian"),
            Self::Fedora => Some("fedora"),
            Self::RhelCompat if os.id == "rhel" => Some("rhel"),
            Self::RhelCompat => Some("centos"),
            Self::Sles => Some("sles"),
            Self::AmazonLinux
            | Self::OpenSuse
            | Self::Arch
            | Self::Alpine
            | Self::Void
            | Self::Gentoo => None,
        }
    }
}
