//! SSH transport layer wrapping russh.
//!
//! This module provides the low-level SSH connection management:
//! connection setup, password authentication and shell creation.

pub mod config;
mod ssh;

use std::future::Future;

pub use config::SshConfig;
pub use ssh::SshTransport;

use crate::channel::{PtyConfig, ShellIo};
use crate::error::Result;

/// An authenticated session that hosts one interactive shell.
///
/// The shell borrows the session, so the session can only be closed once
/// the shell is gone.
pub trait Session: Send {
    /// Shell type opened on this session.
    type Shell<'s>: ShellIo
    where
        Self: 's;

    /// Open the interactive shell. A second call is rejected.
    fn open_shell(
        &mut self,
        pty: PtyConfig,
    ) -> impl Future<Output = Result<Self::Shell<'_>>> + Send;

    /// Close the session.
    fn close(self) -> impl Future<Output = Result<()>> + Send
    where
        Self: Sized;
}
