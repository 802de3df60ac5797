//! Run an external converter and classify how it ended.

use crate::error::ConvertError;
use std::process::{Output, Stdio};
use tokio::process::Command;
use tracing::debug;

/// Spawn `cmd`, wait for it, and return its captured output whatever the
/// exit status. Only a binary that cannot be spawned is an error here
/// ([`ConvertError::EngineUnavailable`]).
pub(crate) async fn spawn(engine: &'static str, mut cmd: Command) -> Result<Output, ConvertError> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    debug!(engine, command = ?cmd.as_std(), "spawning converter");

    let output = cmd
        .output()
        .await
        .map_err(|e| ConvertError::EngineUnavailable {
            engine,
            detail: e.to_string(),
        })?;

    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.trim().is_empty() {
        debug!(engine, "converter stderr: {}", stderr.trim());
    }

    Ok(output)
}

/// Like [`spawn`], but a non-zero exit maps to
/// [`ConvertError::ConversionFailed`] carrying the most useful line of the
/// child's diagnostics.
pub(crate) async fn run(engine: &'static str, cmd: Command) -> Result<Output, ConvertError> {
    let output = spawn(engine, cmd).await?;
    if !output.status.success() {
        return Err(ConvertError::ConversionFailed {
            engine,
            detail: failure_detail(&output),
        });
    }
    Ok(output)
}

/// Last non-empty stderr line, falling back to stdout, then to the exit status.
///
/// Converters tend to log progress before the real error, and a Python
/// traceback ends with the exception message.
pub(crate) fn failure_detail(output: &Output) -> String {
    let last_line = |bytes: &[u8]| {
        String::from_utf8_lossy(bytes)
            .lines()
            .map(str::trim)
            .rev()
            .find(|l| !l.is_empty())
            .map(str::to_string)
    };
    last_line(&output.stderr)
        .or_else(|| last_line(&output.stdout))
        .unwrap_or_else(|| format!("converter exited with {}", output.status))
}
