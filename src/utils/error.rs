use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OpsError {
    #[error("Required tool is not installed: {tool}")]
    MissingTool { tool: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Env file error ({path}): {message}")]
    EnvFileError { path: String, message: String },

    #[error("Command failed{}: {command}", .code.map(|c| format!(" with exit code {}", c)).unwrap_or_default())]
    CommandFailed { command: String, code: Option<i32> },

    #[error("{target} did not accept connections within {waited:?}")]
    ReadinessTimeout { target: String, waited: Duration },

    #[error("Aborted: {action} was not confirmed")]
    Aborted { action: String },

    #[error("Backup error: {message}")]
    BackupError { message: String },

    #[error("Usage error: {message}")]
    UsageError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Tooling,
    Configuration,
    Process,
    Network,
    Io,
    UserDecision,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl OpsError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            OpsError::MissingTool { .. } => ErrorCategory::Tooling,
            OpsError::ConfigValidationError { .. }
            | OpsError::InvalidConfigValueError { .. }
            | OpsError::MissingConfigError { .. }
            | OpsError::EnvFileError { .. }
            | OpsError::UsageError { .. } => ErrorCategory::Configuration,
            OpsError::CommandFailed { .. } => ErrorCategory::Process,
            OpsError::HttpError(_) | OpsError::ReadinessTimeout { .. } => ErrorCategory::Network,
            OpsError::IoError(_) | OpsError::SerializationError(_) | OpsError::BackupError { .. } => {
                ErrorCategory::Io
            }
            OpsError::Aborted { .. } => ErrorCategory::UserDecision,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            OpsError::Aborted { .. } => ErrorSeverity::Low,
            OpsError::HttpError(_) | OpsError::ReadinessTimeout { .. } => ErrorSeverity::Medium,
            OpsError::MissingTool { .. } | OpsError::IoError(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            OpsError::MissingTool { tool } => {
                format!("Install '{}' and make sure it is on PATH", tool)
            }
            OpsError::ConfigValidationError { field, .. }
            | OpsError::InvalidConfigValueError { field, .. } => {
                format!("Check the '{}' setting in ops.toml or the environment", field)
            }
            OpsError::MissingConfigError { field } => {
                format!("Set '{}' in ops.toml or export it before running", field)
            }
            OpsError::EnvFileError { .. } => {
                "Create the env file from its template (booking-ops setup-env)".to_string()
            }
            OpsError::CommandFailed { .. } => {
                "Inspect the command output above; rerun with --verbose for the full command line"
                    .to_string()
            }
            OpsError::ReadinessTimeout { .. } => {
                "Verify the dependency is running and the URL host/port are correct".to_string()
            }
            OpsError::HttpError(_) => "Check that the API container is up (booking-ops logs)".to_string(),
            OpsError::Aborted { .. } => "Rerun and answer 'y' to proceed".to_string(),
            OpsError::BackupError { .. } => {
                "Check the backup directory and the file name passed to restore".to_string()
            }
            OpsError::UsageError { .. } => "Run with --help to see usage".to_string(),
            OpsError::IoError(_) | OpsError::SerializationError(_) => {
                "Check file permissions and available disk space".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            OpsError::MissingTool { tool } => format!("{} is not installed", tool),
            OpsError::Aborted { action } => format!("{} cancelled", action),
            OpsError::CommandFailed { command, .. } => format!("'{}' failed", command),
            other => other.to_string(),
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            OpsError::Aborted { .. } => 1,
            OpsError::MissingTool { .. } => 127,
            OpsError::CommandFailed { code, .. } => code.filter(|c| *c != 0).unwrap_or(1),
            other => match other.severity() {
                ErrorSeverity::Low | ErrorSeverity::High => 1,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::Critical => 3,
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, OpsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_failed_propagates_child_code() {
        let err = OpsError::CommandFailed {
            command: "pytest tests/ -v".to_string(),
            code: Some(5),
        };
        assert_eq!(err.exit_code(), 5);
        assert_eq!(err.category(), ErrorCategory::Process);
        assert!(err.to_string().contains("exit code 5"));

        let killed = OpsError::CommandFailed {
            command: "pytest".to_string(),
            code: None,
        };
        assert_eq!(killed.exit_code(), 1);
    }

    #[test]
    fn test_missing_tool_and_abort_codes() {
        let missing = OpsError::MissingTool {
            tool: "docker".to_string(),
        };
        assert_eq!(missing.exit_code(), 127);
        assert!(missing.recovery_suggestion().contains("docker"));

        let aborted = OpsError::Aborted {
            action: "db-reset".to_string(),
        };
        assert_eq!(aborted.exit_code(), 1);
        assert_eq!(aborted.category(), ErrorCategory::UserDecision);
        assert_eq!(aborted.user_friendly_message(), "db-reset cancelled");
    }
}
