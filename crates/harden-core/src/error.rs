use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HardenError {
    #[error("service not found: {0}")]
    ServiceNotFound(String),

    #[error("failed to stop service '{service}': {reason}")]
    StopFailed { service: String, reason: String },

    #[error("failed to set startup mode of '{service}' to {mode}: {reason}")]
    ModeWriteFailed {
        service: String,
        mode: String,
        reason: String,
    },

    #[error("undo log not found: {}", .0.display())]
    UndoLogNotFound(PathBuf),

    #[error("invalid startup mode '{0}': expected Boot, System, Automatic, Manual or Disabled")]
    InvalidModeString(String),

    #[error("malformed log record at line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },

    #[error("unsupported log schema version {version} at line {line}")]
    UnsupportedSchema { line: usize, version: String },

    #[error("required tool not found on PATH: {0}")]
    ToolNotFound(String),

    #[error("command '{command}' failed: {message}")]
    CommandFailed { command: String, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, HardenError>;
