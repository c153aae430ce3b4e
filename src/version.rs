//! Dotted version comparison.
//!
//! Docker and Compose report versions like `24.0.7`, `v2.24.5`,
//! `20.10.24+dfsg1` or `5:24.0.7-1~ubuntu.22.04~jammy`. Only the leading
//! numeric dotted part matters for the minimum-version check, compared
//! segment by segment as unbounded integers.

use std::cmp::Ordering;
use std::fmt;

/// Numeric segments of a version string.
///
/// Segments are kept as digit strings without leading zeros, so a segment
/// too large for any integer type still orders correctly. Trailing zero
/// segments are insignificant: `24.0` and `24.0.0` compare equal.
#[derive(Debug, Clone)]
pub struct DottedVersion {
    segments: Vec<String>,
}

impl DottedVersion {
    /// Parse the leading dotted-numeric part of `s`.
    ///
    /// Returns `None` when `s` has no numeric content at all.
    pub fn parse(s: &str) -> Option<Self> {
        let stripped = strip_version(s);
        if stripped.is_empty() {
            return None;
        }

        let segments = stripped.split('.').map(normalize_segment).collect();

        Some(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    fn segment(&self, idx: usize) -> &str {
        self.segments.get(idx).map(String::as_str).unwrap_or("0")
    }
}

/// `007` -> `7`, empty -> `0`
fn normalize_segment(seg: &str) -> String {
    let trimmed = seg.trim_start_matches('0');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Numeric order of two normalized digit strings.
fn cmp_segment(a: &str, b: &str) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

impl PartialEq for DottedVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for DottedVersion {}

impl PartialOrd for DottedVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DottedVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.segments.len().max(other.segments.len());
        (0..len)
            .map(|i| cmp_segment(self.segment(i), other.segment(i)))
            .find(|ord| *ord != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }
}

impl fmt::Display for DottedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

/// Strip everything that is not part of the numeric dotted version.
///
/// Skips a non-numeric prefix (`v2.24.5`), a Debian epoch (`5:24.0.7`), then
/// keeps the longest run of digits and dots and drops trailing dots.
pub fn strip_version(s: &str) -> &str {
    let s = s.trim();
    let s = match s.split_once(':') {
        Some((epoch, rest)) if !epoch.is_empty() && epoch.bytes().all(|b| b.is_ascii_digit()) => {
            rest
        }
        _ => s,
    };

    let start = match s.find(|c: char| c.is_ascii_digit()) {
        Some(idx) => idx,
        None => return "",
    };
    let rest = &s[start..];
    let end = rest
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(rest.len());

    rest[..end].trim_end_matches('.')
}

/// Report whether version `a` is greater than or equal to version `b`.
///
/// An `a` without numeric content is never satisfied; a `b` without numeric
/// content is satisfied by any parseable `a`.
pub fn version_ge(a: &str, b: &str) -> bool {
    match (DottedVersion::parse(a), DottedVersion::parse(b)) {
        (Some(a), Some(b)) => a >= b,
        (Some(_), None) => true,
        (None, _) => false,
    }
}

/// Extract the engine version from `docker --version` output.
///
/// `Docker version 24.0.7, build afdd53b` yields `24.0.7`. Podman's docker
/// shim (`podman version 4.9.4`) is not Docker and yields `None`.
pub fn parse_docker_version(output: &str) -> Option<String> {
    let line = output.lines().find(|l| !l.trim().is_empty())?.trim();
    if line.to_ascii_lowercase().starts_with("podman") {
        return None;
    }

    let after = line
        .split_once("version")
        .map(|(_, rest)| rest)
        .unwrap_or(line);
    let token = after
        .split(|c: char| c == ',' || c.is_whitespace())
        .find(|t| !t.is_empty())?;

    let stripped = strip_version(token);
    if stripped.is_empty() {
        None
    } else {
        Some(stripped.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_segment_ordering() {
        assert!(version_ge("24.0.10", "24.0.2"));
        assert!(!version_ge("24.0.2", "24.0.10"));
        assert!(version_ge("5.10", "5.9"));
        assert!(!version_ge("5.9", "5.10"));
    }

    #[test]
    fn test_equal_versions() {
        assert!(version_ge("20.10.0", "20.10.0"));
        assert!(version_ge("24.0", "24.0.0"));
        assert!(version_ge("24.0.0", "24.0"));
    }

    #[test]
    fn test_suffixes_are_stripped() {
        assert!(version_ge("20.10.24+dfsg1", "20.10.0"));
        assert!(version_ge("24.0.7-1ubuntu", "24.0.7"));
        assert!(version_ge("v2.24.5", "2.20"));
        assert!(version_ge("5:24.0.7-1~ubuntu.22.04~jammy", "24.0.7"));
        assert!(!version_ge("19.03.15-ce", "20.10.0"));
    }

    #[test]
    fn test_non_numeric_inputs() {
        assert!(!version_ge("", "20.10.0"));
        assert!(!version_ge("unknown", "1"));
        assert!(version_ge("1.0", ""));
    }

    #[test]
    fn test_strip_version() {
        assert_eq!(strip_version("v2.29.7"), "2.29.7");
        assert_eq!(strip_version("24.0.7,"), "24.0.7");
        assert_eq!(strip_version("26.1.0-rc.1"), "26.1.0");
        assert_eq!(strip_version("1.2."), "1.2");
        assert_eq!(strip_version("dev"), "");
    }

    #[test]
    fn test_display_round_trips_segments() {
        let v = DottedVersion::parse("v24.0.10-ce").expect("parse");
        assert_eq!(v.to_string(), "24.0.10");
        assert_eq!(v.segments(), &["24", "0", "10"]);
    }

    #[test]
    fn test_segments_beyond_u64_keep_their_order() {
        assert!(version_ge("18446744073709551616.0", "20.10.0"));
        assert!(!version_ge("20.10.0", "18446744073709551616.0"));
        assert!(version_ge("1.18446744073709551617", "1.18446744073709551616"));
        assert!(version_ge("24.007", "24.7"));
        assert!(version_ge("24.7", "24.007"));
    }

    #[test]
    fn test_parse_docker_version() {
        assert_eq!(
            parse_docker_version("Docker version 24.0.7, build afdd53b\n").as_deref(),
            Some("24.0.7")
        );
        assert_eq!(
            parse_docker_version("Docker version 20.10.24+dfsg1, build 297e128").as_deref(),
            Some("20.10.24")
        );
        assert_eq!(parse_docker_version("podman version 4.9.4"), None);
        assert_eq!(parse_docker_version(""), None);
    }
}
