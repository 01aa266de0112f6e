//! Running external utilities.

use crate::error::ExecutionError;
use std::process::{Command, Output};
use tracing::debug;

/// Render a command line for diagnostics.
pub fn command_to_string(command: &Command) -> String {
    std::iter::once(command.get_program())
        .chain(command.get_args())
        .map(|s| s.to_string_lossy().into_owned())
        .collect::<Vec<String>>()
        .join(" ")
}

/// Run the command to completion and check its exit status.
///
/// Stdout and stderr are captured; a non-zero exit keeps both in the error.
pub fn execute(command: &mut Command) -> Result<Output, ExecutionError> {
    let rendered = command_to_string(command);
    debug!(command = %rendered, "Running command");

    let output = command
        .output()
        .map_err(|err| ExecutionError::ExecutionStart {
            command: rendered.clone(),
            err,
        })?;

    if !output.status.success() {
        let err = ExecutionError::CommandFailure {
            command: rendered,
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        debug!(error = %err, "Command failed");
        return Err(err);
    }

    Ok(output)
}
