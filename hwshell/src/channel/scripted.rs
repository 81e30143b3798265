//! In-memory shell and session that replay scripted device output.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use super::{PtyConfig, ShellIo};
use crate::error::{ChannelError, Result};
use crate::transport::Session;

/// Shell double: every `read` pops the next scripted buffer and every
/// `send` is recorded.
#[derive(Debug, Default)]
pub(crate) struct ScriptedShell {
    replies: VecDeque<String>,
    stderr: Vec<u8>,
    sent: Vec<String>,
    /// Once the script runs out, reads hang instead of timing out.
    stall: bool,
    closed: Arc<Closed>,
}

/// Which parts of a scripted session were closed.
#[derive(Debug, Default)]
pub(crate) struct Closed {
    pub(crate) shell: AtomicBool,
    pub(crate) session: AtomicBool,
}

impl Closed {
    pub(crate) fn shell(&self) -> bool {
        self.shell.load(Ordering::SeqCst)
    }

    pub(crate) fn session(&self) -> bool {
        self.session.load(Ordering::SeqCst)
    }
}

impl ScriptedShell {
    pub(crate) fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: replies.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub(crate) fn with_stderr(mut self, stderr: &str) -> Self {
        self.stderr = stderr.as_bytes().to_vec();
        self
    }

    pub(crate) fn stalled(mut self) -> Self {
        self.stall = true;
        self
    }

    pub(crate) fn sent(&self) -> &[String] {
        &self.sent
    }

    pub(crate) fn count_sent(&self, text: &str) -> usize {
        self.sent.iter().filter(|s| *s == text).count()
    }

    pub(crate) fn remaining(&self) -> usize {
        self.replies.len()
    }
}

impl ShellIo for ScriptedShell {
    async fn send(&mut self, text: &str) -> Result<()> {
        self.sent.push(text.to_string());
        Ok(())
    }

    async fn read(&mut self, max_bytes: usize, timeout: Duration) -> Result<Vec<u8>> {
        let Some(reply) = self.replies.pop_front() else {
            if self.stall {
                std::future::pending::<()>().await;
            }
            return Err(ChannelError::Timeout(timeout).into());
        };
        let mut reply = reply.into_bytes();
        reply.truncate(max_bytes);
        Ok(reply)
    }

    fn take_stderr(&mut self, max_bytes: usize) -> Vec<u8> {
        let n = self.stderr.len().min(max_bytes);
        self.stderr.drain(..n).collect()
    }

    async fn close(self) -> Result<()> {
        self.closed.shell.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Session double hosting one scripted shell.
#[derive(Debug)]
pub(crate) struct ScriptedSession {
    shell: Option<ScriptedShell>,
    open_error: Option<ChannelError>,
    closed: Arc<Closed>,
}

impl ScriptedSession {
    pub(crate) fn new(mut shell: ScriptedShell) -> Self {
        let closed = Arc::new(Closed::default());
        shell.closed = Arc::clone(&closed);
        Self {
            shell: Some(shell),
            open_error: None,
            closed,
        }
    }

    /// A session whose shell request is refused.
    pub(crate) fn refusing(reason: &str) -> Self {
        Self {
            shell: None,
            open_error: Some(ChannelError::ShellOpenFailed {
                reason: reason.to_string(),
            }),
            closed: Arc::default(),
        }
    }

    pub(crate) fn closed(&self) -> Arc<Closed> {
        Arc::clone(&self.closed)
    }
}

impl Session for ScriptedSession {
    type Shell<'s> = ScriptedShell;

    async fn open_shell(&mut self, _pty: PtyConfig) -> Result<ScriptedShell> {
        if let Some(err) = self.open_error.take() {
            return Err(err.into());
        }
        self.shell
            .take()
            .ok_or_else(|| ChannelError::ShellAlreadyOpen.into())
    }

    async fn close(self) -> Result<()> {
        self.closed.session.store(true, Ordering::SeqCst);
        Ok(())
    }
}
