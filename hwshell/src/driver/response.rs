//! Result types for command and save workflows.

use std::fmt;
use std::time::Duration;

/// Message reported when the save sequence did not confirm success.
pub const SAVE_FAILED_MESSAGE: &str = "not save config!";

/// Classification of a command's output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// No error marker matched.
    Success,

    /// The named error marker matched.
    Failure { marker: &'static str },
}

/// Response from one command execution.
#[derive(Debug, Clone)]
pub struct Response {
    /// The command that was executed.
    pub command: String,

    /// Output: echo and trailing prompt removed on success, raw on failure.
    pub stdout: String,

    /// Extended-data output, usually empty on a PTY.
    pub stderr: String,

    /// Success or the matched error marker.
    pub outcome: Outcome,

    /// Number of buffers read, including pagination continuations.
    pub pages: usize,

    /// Time taken to execute the command.
    pub elapsed: Duration,
}

impl Response {
    /// Check if the response indicates success.
    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Success
    }

    /// Return code: 0 on success, 1 on failure.
    pub fn rc(&self) -> i32 {
        if self.is_success() { 0 } else { 1 }
    }

    /// The stdout lines, in order.
    pub fn stdout_lines(&self) -> impl Iterator<Item = &str> {
        self.stdout.lines()
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.stdout)
    }
}

/// Result of the save-and-confirm sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveResult {
    /// 0 when the device confirmed the save, 1 otherwise.
    pub rc: i32,

    /// Buffer read after the confirmation.
    pub output: String,
}

impl SaveResult {
    pub fn is_success(&self) -> bool {
        self.rc == 0
    }
}

/// Why an execution is reported as failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionFailure {
    /// The device rejected the command; carries stdout followed by stderr.
    Command { message: String },

    /// The save sequence did not report success.
    SaveConfig,
}

impl fmt::Display for ExecutionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Command { message } => f.write_str(message),
            Self::SaveConfig => f.write_str(SAVE_FAILED_MESSAGE),
        }
    }
}

/// Everything one device invocation produced.
#[derive(Debug, Clone)]
pub struct Execution {
    /// The command response.
    pub response: Response,

    /// Whether the command is assumed to have changed device state.
    pub changed: bool,

    /// Save result, when saving was requested and attempted.
    pub saved: Option<SaveResult>,
}

impl Execution {
    /// The failure to report, if any. Command failure takes precedence.
    pub fn failure(&self) -> Option<ExecutionFailure> {
        if !self.response.is_success() {
            return Some(ExecutionFailure::Command {
                message: format!("{}{}", self.response.stdout, self.response.stderr),
            });
        }
        match &self.saved {
            Some(save) if !save.is_success() => Some(ExecutionFailure::SaveConfig),
            _ => None,
        }
    }
}
