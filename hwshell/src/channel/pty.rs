//! Interactive PTY shell over a russh channel.

use std::marker::PhantomData;
use std::time::Duration;

use bytes::BytesMut;
use log::{debug, trace};
use russh::client::Msg;
use russh::{Channel, ChannelMsg};
use tokio::time::Instant;

use super::ShellIo;
use crate::error::{ChannelError, Result};

/// Extended-data type code for stderr.
const SSH_EXTENDED_DATA_STDERR: u32 = 1;

/// Configuration for PTY shell reads.
#[derive(Debug, Clone)]
pub struct PtyConfig {
    /// A read stops collecting once no data arrived for this long.
    pub quiet_period: Duration,

    /// Bound on waiting for the server's reply to the pty/shell requests.
    pub reply_timeout: Duration,
}

impl Default for PtyConfig {
    fn default() -> Self {
        Self {
            quiet_period: Duration::from_millis(100),
            reply_timeout: Duration::from_secs(10),
        }
    }
}

/// Output received from the channel but not yet handed out.
#[derive(Debug, Default)]
struct Pending {
    /// Stdout not yet handed out by `read`.
    stdout: BytesMut,

    /// Stderr not yet handed out by `take_stderr`.
    stderr: BytesMut,
}

impl Pending {
    /// Position to compare later arrivals against.
    fn mark(&self) -> usize {
        self.stderr.len()
    }

    /// Whether stdout is waiting or stderr grew since `mark`.
    fn arrived_since(&self, mark: usize) -> bool {
        !self.stdout.is_empty() || self.stderr.len() > mark
    }

    fn take_stdout(&mut self, max_bytes: usize) -> Vec<u8> {
        let n = self.stdout.len().min(max_bytes);
        self.stdout.split_to(n).to_vec()
    }

    fn take_stderr(&mut self, max_bytes: usize) -> Vec<u8> {
        let n = self.stderr.len().min(max_bytes);
        self.stderr.split_to(n).to_vec()
    }
}

/// Interactive shell on an SSH session.
///
/// Borrows the transport it was opened on for `'t`; the transport cannot
/// be closed or used to open another shell while this value is alive.
pub struct PtyShell<'t> {
    channel: Channel<Msg>,

    config: PtyConfig,

    pending: Pending,

    /// The remote side sent EOF or closed the channel.
    eof: bool,

    _transport: PhantomData<&'t ()>,
}

impl PtyShell<'_> {
    /// Request a PTY and an interactive shell on a freshly opened channel.
    pub(crate) async fn open(
        channel: Channel<Msg>,
        width: u32,
        height: u32,
        config: PtyConfig,
    ) -> Result<Self> {
        let mut shell = Self {
            channel,
            config,
            pending: Pending {
                stdout: BytesMut::with_capacity(4096),
                stderr: BytesMut::new(),
            },
            eof: false,
            _transport: PhantomData,
        };

        shell
            .channel
            .request_pty(true, "xterm", width, height, 0, 0, &[])
            .await
            .map_err(|e| ChannelError::ShellOpenFailed {
                reason: e.to_string(),
            })?;
        shell.expect_reply("pty").await?;

        shell
            .channel
            .request_shell(true)
            .await
            .map_err(|e| ChannelError::ShellOpenFailed {
                reason: e.to_string(),
            })?;
        shell.expect_reply("shell").await?;

        debug!("interactive shell open ({width}x{height})");
        Ok(shell)
    }

    /// Wait for the server to accept or refuse a channel request.
    async fn expect_reply(&mut self, request: &str) -> Result<()> {
        let deadline = Instant::now() + self.config.reply_timeout;
        loop {
            match tokio::time::timeout_at(deadline, self.channel.wait()).await {
                Err(_) => {
                    return Err(ChannelError::ShellOpenFailed {
                        reason: format!("no reply to {request} request"),
                    }
                    .into());
                }
                Ok(None) => {
                    return Err(ChannelError::ShellOpenFailed {
                        reason: "channel closed".to_string(),
                    }
                    .into());
                }
                Ok(Some(ChannelMsg::Success)) => return Ok(()),
                Ok(Some(ChannelMsg::Failure)) => {
                    return Err(ChannelError::ShellOpenFailed {
                        reason: format!("{request} request refused"),
                    }
                    .into());
                }
                Ok(Some(msg)) => self.absorb(msg),
            }
        }
    }

    /// File one channel message into the pending buffers.
    fn absorb(&mut self, msg: ChannelMsg) {
        match msg {
            ChannelMsg::Data { ref data } => self.pending.stdout.extend_from_slice(data),
            ChannelMsg::ExtendedData { ref data, ext } if ext == SSH_EXTENDED_DATA_STDERR => {
                self.pending.stderr.extend_from_slice(data)
            }
            ChannelMsg::Eof | ChannelMsg::Close => {
                debug!("shell closed by remote");
                self.eof = true;
            }
            ChannelMsg::ExitStatus { exit_status } => {
                debug!("shell exited with status {exit_status}");
            }
            other => trace!("ignoring channel message {other:?}"),
        }
    }
}

impl ShellIo for PtyShell<'_> {
    async fn send(&mut self, text: &str) -> Result<()> {
        trace!("send {text:?}");
        self.channel
            .data(text.as_bytes())
            .await
            .map_err(ChannelError::Ssh)?;
        Ok(())
    }

    async fn read(&mut self, max_bytes: usize, timeout: Duration) -> Result<Vec<u8>> {
        let deadline = Instant::now() + timeout;
        let mark = self.pending.mark();

        while !self.pending.arrived_since(mark) {
            if self.eof {
                return Err(ChannelError::Closed.into());
            }
            match tokio::time::timeout_at(deadline, self.channel.wait()).await {
                Err(_) => return Err(ChannelError::Timeout(timeout).into()),
                Ok(None) => self.eof = true,
                Ok(Some(msg)) => self.absorb(msg),
            }
        }

        // Output arrives in bursts; keep collecting until the line goes quiet.
        while !self.eof && self.pending.stdout.len() < max_bytes {
            match tokio::time::timeout(self.config.quiet_period, self.channel.wait()).await {
                Err(_) => break,
                Ok(None) => self.eof = true,
                Ok(Some(msg)) => self.absorb(msg),
            }
        }

        let chunk = self.pending.take_stdout(max_bytes);
        trace!("read {} bytes", chunk.len());
        Ok(chunk)
    }

    fn take_stderr(&mut self, max_bytes: usize) -> Vec<u8> {
        self.pending.take_stderr(max_bytes)
    }

    async fn close(self) -> Result<()> {
        if !self.eof {
            self.channel.close().await.map_err(ChannelError::Ssh)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stale_stderr_is_not_an_arrival() {
        let mut pending = Pending::default();
        pending.stderr.extend_from_slice(b"% leftover warning\r\n");

        let mark = pending.mark();
        assert!(!pending.arrived_since(mark));

        pending.stderr.extend_from_slice(b"new");
        assert!(pending.arrived_since(mark));
    }

    #[test]
    fn test_stdout_is_an_arrival() {
        let mut pending = Pending::default();
        let mark = pending.mark();
        pending.stdout.extend_from_slice(b"<HUAWEI>");
        assert!(pending.arrived_since(mark));
    }

    #[test]
    fn test_take_is_bounded() {
        let mut pending = Pending::default();
        pending.stdout.extend_from_slice(b"abcdef");
        pending.stderr.extend_from_slice(b"xyz");

        assert_eq!(pending.take_stdout(4), b"abcd");
        assert_eq!(pending.take_stdout(4), b"ef");
        assert_eq!(pending.take_stderr(2), b"xy");
        assert_eq!(pending.mark(), 1);
    }

    #[test]
    fn test_default_pty_config() {
        let config = PtyConfig::default();
        assert_eq!(config.quiet_period, Duration::from_millis(100));
        assert_eq!(config.reply_timeout, Duration::from_secs(10));
    }
}
