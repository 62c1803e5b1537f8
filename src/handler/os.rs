//! OS command handler.
//!
//! Spawns the requested executable with an argument vector via
//! `tokio::process::Command`. No shell is involved, so parameters are never
//! interpolated or word-split; a parameter containing `;` or `$( )` is just
//! an argument string.

use std::process::Stdio;

use tokio::process::Command;

use crate::error::CommandError;
use crate::message::{CommandOutput, Request};

use super::registry::{BoxFuture, CommandHandler, HandlerOutcome};

/// Handler for `os` requests.
pub struct OsHandler;

impl CommandHandler for OsHandler {
    fn call(&self, request: Request) -> BoxFuture<'static, HandlerOutcome> {
        Box::pin(async move {
            let command_name = request.command_name.ok_or_else(|| {
                CommandError::OsExecution("command_name field is required".to_string())
            })?;

            run_command(&command_name, &request.parameters).await
        })
    }
}

/// Run one command to completion; exactly one attempt, no retry.
async fn run_command(command_name: &str, parameters: &[String]) -> HandlerOutcome {
    let output = Command::new(command_name)
        .args(parameters)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| CommandError::OsExecution(format!("failed to spawn '{command_name}': {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(CommandError::OsExecution(format!(
            "'{command_name}' exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    Ok(CommandOutput::Text(stdout))
}
