//! `/etc/os-release` parsing.
//!
//! The file is a list of `KEY=value` lines in shell syntax. Values may be
//! double- or single-quoted; blank lines and `#` comments are ignored.

use crate::error::{DockerbootError, Result};
use crate::executor::Executor;
use std::collections::BTreeMap;
use std::path::Path;

/// Identification fields of the running distribution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OsRelease {
    /// `ID`, lowercased (e.g. `ubuntu`)
    pub id: String,
    /// `ID_LIKE`, split on whitespace, in file order
    pub id_like: Vec<String>,
    pub version_id: Option<String>,
    pub version_codename: Option<String>,
    pub ubuntu_codename: Option<String>,
    pub debian_codename: Option<String>,
    pub pretty_name: Option<String>,
    /// Every other key
    pub extra: BTreeMap<String, String>,
}

impl OsRelease {
    /// Parse os-release content.
    pub fn parse(text: &str) -> Self {
        let mut release = OsRelease::default();

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, raw)) = line.split_once('=') else {
                continue;
            };
            let value = unquote(raw.trim());

            match key.trim() {
                "ID" => release.id = value.to_ascii_lowercase(),
                "ID_LIKE" => {
                    release.id_like = value
                        .split_whitespace()
                        .map(str::to_ascii_lowercase)
                        .collect();
                }
                "VERSION_ID" => release.version_id = non_empty(value),
                "VERSION_CODENAME" => release.version_codename = non_empty(value),
                "UBUNTU_CODENAME" => release.ubuntu_codename = non_empty(value),
                "DEBIAN_CODENAME" => release.debian_codename = non_empty(value),
                "PRETTY_NAME" => release.pretty_name = non_empty(value),
                other => {
                    release.extra.insert(other.to_string(), value);
                }
            }
        }

        release
    }

    /// Read and parse os-release from `path`.
    pub fn load(exec: &dyn Executor, path: &Path) -> Result<Self> {
        let text = exec.read_to_string(path).map_err(|e| {
            DockerbootError::config(format!(
                "cannot read {} to identify the distribution: {}",
                path.display(),
                e
            ))
        })?;

        let release = Self::parse(&text);
        if release.id.is_empty() {
            return Err(DockerbootError::config(format!(
                "{} has no ID field",
                path.display()
            )));
        }
        Ok(release)
    }

    /// Release codename used by APT repositories.
    ///
    /// Derivatives (Mint, Pop!_OS, LMDE) carry the upstream codename in
    /// `UBUNTU_CODENAME` / `DEBIAN_CODENAME`; those win over their own
    /// `VERSION_CODENAME`.
    pub fn codename(&self) -> Option<&str> {
        self.ubuntu_codename
            .as_deref()
            .or(self.debian_codename.as_deref())
            .or(self.version_codename.as_deref())
    }

    /// Human-readable name, falling back to `ID`.
    pub fn display_name(&self) -> &str {
        self.pretty_name.as_deref().unwrap_or(&self.id)
    }

    pub fn id_like_joined(&self) -> String {
        self.id_like.join(" ")
    }
}

fn unquote(raw: &str) -> String {
    let stripped = raw
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| raw.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')))
        .unwrap_or(raw);
    stripped.replace("\\\"", "\"").replace("\\$", "$")
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}
