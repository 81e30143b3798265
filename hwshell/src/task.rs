//! Task request/response contract.
//!
//! A host framework hands over one [`TaskRequest`] per device task and
//! renders the returned [`TaskResult`] as structured data. Argument
//! validation beyond deserialization is the framework's job.

use log::{debug, error};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::driver::{DeviceClientBuilder, Execution, Timings};
use crate::error::Error;

fn default_port() -> u16 {
    22
}

/// One device task.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskRequest {
    /// Command block sent to the device.
    pub command: String,

    /// Device address.
    pub shost: String,

    /// SSH port.
    #[serde(default = "default_port")]
    pub sport: u16,

    /// SSH user.
    pub suser: String,

    /// SSH password. Never logged or echoed back.
    pub spass: SecretString,

    /// Save the configuration after a successful command.
    #[serde(default)]
    pub save: bool,
}

/// Result of one device task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskResult {
    /// The command is assumed to have changed device state.
    pub changed: bool,

    /// The task failed; `msg` says why.
    pub failed: bool,

    /// The command that was run.
    pub command: String,

    /// 0 on success, 1 on failure.
    pub rc: i32,

    /// Command output.
    pub stdout: String,

    /// `stdout` split into lines.
    pub stdout_lines: Vec<String>,

    /// Extended-data output.
    pub stderr: String,

    /// Human-readable diagnostic, present on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
}

impl TaskResult {
    /// Build the result of a completed device invocation.
    pub fn from_execution(execution: Execution) -> Self {
        let failure = execution.failure();
        let response = execution.response;
        Self {
            changed: execution.changed,
            failed: failure.is_some(),
            rc: response.rc(),
            stdout_lines: response.stdout_lines().map(str::to_string).collect(),
            stdout: response.stdout,
            stderr: response.stderr,
            command: response.command,
            msg: failure.map(|f| f.to_string()),
        }
    }

    /// Build the result of an invocation that could not complete.
    pub fn from_error(command: impl Into<String>, err: &Error) -> Self {
        let msg = if err.is_connection() {
            err.to_string()
        } else if err.is_shell_open() {
            format!("Failed to open session: {err}")
        } else {
            format!("Exec command error.\n{err}")
        };
        Self {
            failed: true,
            command: command.into(),
            rc: 1,
            msg: Some(msg),
            ..Self::default()
        }
    }
}

/// Run one task to completion. Failures are reported in the result.
pub async fn run_task(
    request: &TaskRequest,
    timings: Timings,
    cancel: &CancellationToken,
) -> TaskResult {
    debug!(
        "task for {}@{}:{} (save: {})",
        request.suser, request.shost, request.sport, request.save
    );

    let client = match DeviceClientBuilder::new(&request.shost)
        .port(request.sport)
        .username(&request.suser)
        .password(request.spass.clone())
        .timings(timings)
        .build()
    {
        Ok(client) => client,
        Err(e) => return TaskResult::from_error(&request.command, &e),
    };

    match client.execute(&request.command, request.save, cancel).await {
        Ok(execution) => TaskResult::from_execution(execution),
        Err(e) => {
            error!("task on {} failed: {e}", request.shost);
            TaskResult::from_error(&request.command, &e)
        }
    }
}
