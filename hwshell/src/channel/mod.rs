//! Channel layer: the interactive shell and the patterns used to read it.
//!
//! The command and save workflows are written against [`ShellIo`] so they
//! can run over a real PTY shell or over any other byte stream.

mod buffer;
mod patterns;
mod pty;
#[cfg(test)]
pub(crate) mod scripted;

use std::future::Future;
use std::time::Duration;

pub use buffer::{PageBuffer, normalize_lines, split_lines, strip_echo_and_prompt};
pub use patterns::{
    CONTINUATION_KEY, MORE_MARKER, PatternCatalog, PromptMatcher, SAVE_SUCCESS_MARKER,
};
pub use pty::{PtyConfig, PtyShell};

use crate::error::Result;

/// Raw send/receive primitives of an interactive shell.
pub trait ShellIo: Send {
    /// Write `text` verbatim. Callers append line terminators.
    fn send(&mut self, text: &str) -> impl Future<Output = Result<()>> + Send;

    /// Wait up to `timeout` for output, then return at most `max_bytes`
    /// of stdout.
    ///
    /// Only data that arrives during the call ends the wait; stderr left
    /// over from earlier reads does not. Returns an empty buffer when only
    /// stderr arrived. Fails with
    /// `ChannelError::Timeout` when nothing arrived at all.
    fn read(
        &mut self,
        max_bytes: usize,
        timeout: Duration,
    ) -> impl Future<Output = Result<Vec<u8>>> + Send;

    /// Take up to `max_bytes` of buffered stderr without waiting.
    fn take_stderr(&mut self, max_bytes: usize) -> Vec<u8>;

    /// Close the shell.
    fn close(self) -> impl Future<Output = Result<()>> + Send
    where
        Self: Sized;
}
