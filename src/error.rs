//! Error handling module for dockerboot
//!
//! Provides centralized error handling with proper error types using thiserror.
//! Every fallible step of the provisioning run returns one of these.

use thiserror::Error;

/// Main error type for dockerboot
#[derive(Error, Debug)]
pub enum DockerbootError {
    /// IO errors (reading os-release, writing repo files, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors (bad flag values, missing codename, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A mandatory external command exited non-zero or could not be spawned
    #[error("Command `{command}` failed (exit code {code}): {stderr}")]
    Command {
        command: String,
        code: i32,
        stderr: String,
    },

    /// Neither `ID` nor any `ID_LIKE` entry maps to a supported family
    #[error(
        "Unsupported distribution '{id}' (ID_LIKE: '{id_like}'). Supported families: {supported}"
    )]
    UnsupportedDistro {
        id: String,
        id_like: String,
        supported: String,
    },

    /// No compose plugin release exists for this CPU architecture
    #[error("Unsupported CPU architecture for the compose plugin download: {0}")]
    UnsupportedArch(String),

    /// Not root and no way to escalate
    #[error("Privilege error: {0}")]
    Privilege(String),

    /// Docker daemon could not be started
    #[error("Service error: {0}")]
    Service(String),

    /// Target user lookup or group membership failure
    #[error("User error: {0}")]
    User(String),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// General errors (catch-all for edge cases)
    #[error("{0}")]
    General(String),
}

/// Result type alias for dockerboot operations
pub type Result<T> = std::result::Result<T, DockerbootError>;

// Convenient error constructors
impl DockerbootError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a command failure error
    pub fn command(command: impl Into<String>, code: i32, stderr: impl Into<String>) -> Self {
        Self::Command {
            command: command.into(),
            code,
            stderr: stderr.into(),
        }
    }

    /// Create an unsupported architecture error
    pub fn unsupported_arch(arch: impl Into<String>) -> Self {
        Self::UnsupportedArch(arch.into())
    }

    /// Create a privilege error
    pub fn privilege(msg: impl Into<String>) -> Self {
        Self::Privilege(msg.into())
    }

    /// Create a service error
    pub fn service(msg: impl Into<String>) -> Self {
        Self::Service(msg.into())
    }

    /// Create a user error
    pub fn user(msg: impl Into<String>) -> Self {
        Self::User(msg.into())
    }

    /// Create a general error
    pub fn general(msg: impl Into<String>) -> Self {
        Self::General(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DockerbootError::config("no codename");
        assert_eq!(err.to_string(), "Configuration error: no codename");

        let err = DockerbootError::command("apt-get update", 100, "E: could not resolve host");
        assert_eq!(
            err.to_string(),
            "Command `apt-get update` failed (exit code 100): E: could not resolve host"
        );
    }

    #[test]
    fn test_unsupported_distro_lists_families() {
        let err = DockerbootError::UnsupportedDistro {
            id: "nixos".to_string(),
            id_like: String::new(),
            supported: "debian, ubuntu".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("nixos"));
        assert!(msg.contains("debian, ubuntu"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: DockerbootError = io_err.into();
        assert!(matches!(err, DockerbootError::Io(_)));
    }

    #[test]
    fn test_error_constructors() {
        assert!(matches!(
            DockerbootError::unsupported_arch("i686"),
            DockerbootError::UnsupportedArch(_)
        ));
        assert!(matches!(
            DockerbootError::service("no init system"),
            DockerbootError::Service(_)
        ));
        assert!(matches!(
            DockerbootError::user("no such user"),
            DockerbootError::User(_)
        ));
    }
}
