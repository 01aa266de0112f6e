//! Error types for the swap plugin.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for swap operations.
pub type Result<T> = std::result::Result<T, OpError>;

/// Result type alias for plugin loading.
pub type LoadResult<T> = std::result::Result<T, LoadError>;

/// Errors that keep the plugin from loading.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// A required utility is not on the search path.
    #[error("The '{0}' utility is not available")]
    MissingTool(String),

    /// The utility is present but reports a version older than supported.
    #[error("Too low version of {tool}: {found}. At least {required} required")]
    UnsupportedVersion {
        tool: String,
        found: String,
        required: String,
    },

    /// The utility could not be asked for its version.
    #[error("Failed to determine version of {tool}: {detail}")]
    VersionQuery { tool: String, detail: String },

    /// The plugin configuration is unusable.
    #[error("Invalid swap plugin configuration: {0}")]
    InvalidConfig(String),
}

/// Errors returned by swap operations.
#[derive(Error, Debug)]
pub enum OpError {
    /// Path does not exist or is not a usable device or file.
    #[error("Invalid device {device}: {reason}")]
    InvalidDevice { device: PathBuf, reason: String },

    /// No swap signature found on the device.
    #[error("Device {0} is not formatted as swap")]
    NotSwapFormatted(PathBuf),

    /// A swap signature exists but cannot be activated.
    #[error("Cannot activate swap on {device}: {reason}")]
    UnusableSignature { device: PathBuf, reason: String },

    /// Swap on the device is already active.
    #[error("Swap on {0} is already active")]
    AlreadyActive(PathBuf),

    /// Swap on the device is not active.
    #[error("Swap on {0} is not active")]
    NotActive(PathBuf),

    /// The underlying utility or kernel call failed.
    #[error("{tool} failed: {detail}")]
    ToolFailure { tool: String, detail: String },

    /// Label rejected before reaching the tool.
    #[error("Invalid swap label '{label}': {reason}")]
    InvalidLabel { label: String, reason: String },

    /// UUID rejected before reaching the tool.
    #[error("Invalid swap UUID '{uuid}': {reason}")]
    InvalidUuid { uuid: String, reason: String },

    /// I/O error while reading kernel or device state.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl OpError {
    pub(crate) fn invalid_device(device: &std::path::Path, reason: impl Into<String>) -> Self {
        OpError::InvalidDevice {
            device: device.to_path_buf(),
            reason: reason.into(),
        }
    }
}

/// Failure to run an external command.
#[derive(Error, Debug)]
pub enum ExecutionError {
    /// The process could not be spawned.
    #[error("Failed to start execution of [{command}]: {err}")]
    ExecutionStart {
        command: String,
        err: std::io::Error,
    },

    /// The process ran and exited unsuccessfully.
    #[error("Command [{command}] exited with {status}: {stderr}")]
    CommandFailure {
        command: String,
        status: std::process::ExitStatus,
        stdout: String,
        stderr: String,
    },
}

impl ExecutionError {
    /// Best diagnostic text for the failure: stderr, falling back to stdout.
    pub fn detail(&self) -> String {
        match self {
            ExecutionError::ExecutionStart { err, .. } => err.to_string(),
            ExecutionError::CommandFailure {
                status,
                stdout,
                stderr,
                ..
            } => {
                let text = if stderr.trim().is_empty() {
                    stdout.trim()
                } else {
                    stderr.trim()
                };
                if text.is_empty() {
                    format!("process exited with {}", status)
                } else {
                    text.to_string()
                }
            }
        }
    }

    pub(crate) fn into_op_error(self, tool: &str) -> OpError {
        OpError::ToolFailure {
            tool: tool.to_string(),
            detail: self.detail(),
        }
    }
}

impl From<serde_json::Error> for LoadError {
    fn from(e: serde_json::Error) -> Self {
        LoadError::InvalidConfig(e.to_string())
    }
}
