//! Error types for hwshell.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Main error type for hwshell operations.
#[derive(Error, Debug)]
pub enum Error {
    /// SSH transport-level errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Shell channel errors
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Driver-level errors
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),
}

/// Transport layer errors (SSH connection, authentication).
#[derive(Error, Debug)]
pub enum TransportError {
    /// Failed to reach the host
    #[error("Connection failed to {host}:{port}: {source}")]
    ConnectionFailed {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// SSH handshake or protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Authentication failed
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// Connecting took longer than the configured timeout
    #[error("Connection timed out after {0:?}")]
    Timeout(Duration),
}

/// Shell channel errors.
#[derive(Error, Debug)]
pub enum ChannelError {
    /// The interactive shell could not be established
    #[error("Failed to open shell: {reason}")]
    ShellOpenFailed { reason: String },

    /// A shell was already opened on this session
    #[error("A shell is already open on this session")]
    ShellAlreadyOpen,

    /// No output arrived within the read timeout
    #[error("No output within {0:?}")]
    Timeout(Duration),

    /// Remote side closed the channel
    #[error("Channel closed")]
    Closed,

    /// SSH protocol error on the channel
    #[error("Channel SSH error: {0}")]
    Ssh(#[source] russh::Error),
}

/// Driver layer errors (command workflow, save workflow).
#[derive(Error, Debug)]
pub enum DriverError {
    /// Invalid configuration in the client builder
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// The device kept paginating past the configured page limit
    #[error("Output still paginated after {pages} pages")]
    PaginationLimit { pages: usize },

    /// `quit` was sent the maximum number of times without reaching
    /// the top-level prompt
    #[error("Top-level prompt not reached after {attempts} quit attempts")]
    TopLevelNotReached { attempts: usize },

    /// The invocation was cancelled
    #[error("Operation cancelled")]
    Cancelled,
}

/// Result type alias using hwshell's Error.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether this error came from connecting or authenticating.
    pub fn is_connection(&self) -> bool {
        matches!(self, Error::Transport(_))
    }

    /// Whether this error came from opening the interactive shell.
    pub fn is_shell_open(&self) -> bool {
        matches!(
            self,
            Error::Channel(ChannelError::ShellOpenFailed { .. } | ChannelError::ShellAlreadyOpen)
        )
    }
}
