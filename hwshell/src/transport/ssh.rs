//! SSH transport implementation using russh.

use std::sync::Arc;

use log::{debug, warn};
use russh::client::{self, Handle};
use russh::keys::PublicKey;
use secrecy::ExposeSecret;

use super::Session;
use super::config::SshConfig;
use crate::channel::{PtyConfig, PtyShell};
use crate::error::{ChannelError, Result, TransportError};

/// SSH transport wrapping a russh client session.
///
/// Owns the authenticated connection to one device. At most one
/// interactive shell may be opened on it.
pub struct SshTransport {
    /// The russh session handle.
    session: Handle<SshHandler>,

    /// Configuration used for this connection.
    config: SshConfig,

    /// Set once `open_shell` has succeeded.
    shell_opened: bool,
}

impl SshTransport {
    /// Connect to the SSH server and authenticate with the configured password.
    pub async fn connect(config: SshConfig) -> Result<Self> {
        debug!("connecting to {}", config.socket_addr());

        let ssh_config = Arc::new(client::Config {
            inactivity_timeout: Some(config.timeout),
            ..Default::default()
        });

        let handler = SshHandler {
            host: config.host.clone(),
            port: config.port,
        };

        let mut session = tokio::time::timeout(
            config.timeout,
            client::connect(ssh_config, (config.host.as_str(), config.port), handler),
        )
        .await
        .map_err(|_| TransportError::Timeout(config.timeout))?
        .map_err(|e| match e {
            russh::Error::IO(source) => TransportError::ConnectionFailed {
                host: config.host.clone(),
                port: config.port,
                source,
            },
            other => TransportError::Ssh(other),
        })?;

        tokio::time::timeout(config.timeout, Self::authenticate(&mut session, &config))
            .await
            .map_err(|_| TransportError::Timeout(config.timeout))??;

        debug!("authenticated to {} as {}", config.socket_addr(), config.username);

        Ok(Self {
            session,
            config,
            shell_opened: false,
        })
    }

    /// Authenticate with the server.
    async fn authenticate(session: &mut Handle<SshHandler>, config: &SshConfig) -> Result<()> {
        let success = session
            .authenticate_password(&config.username, config.password.expose_secret())
            .await
            .map_err(TransportError::Ssh)?
            .success();

        if !success {
            return Err(TransportError::AuthenticationFailed {
                user: config.username.clone(),
            }
            .into());
        }

        Ok(())
    }

    /// Check whether the session's background task is still running.
    pub fn is_alive(&self) -> bool {
        !self.session.is_closed()
    }
}

impl Session for SshTransport {
    type Shell<'s> = PtyShell<'s>;

    /// Open the interactive PTY shell on this connection.
    ///
    /// The shell borrows the transport, so the transport cannot be closed
    /// while the shell is in use. A second call is rejected.
    async fn open_shell(&mut self, pty: PtyConfig) -> Result<PtyShell<'_>> {
        if self.shell_opened {
            return Err(ChannelError::ShellAlreadyOpen.into());
        }

        let channel = self
            .session
            .channel_open_session()
            .await
            .map_err(|e| ChannelError::ShellOpenFailed {
                reason: e.to_string(),
            })?;

        let shell = PtyShell::open(
            channel,
            self.config.terminal_width,
            self.config.terminal_height,
            pty,
        )
        .await?;

        self.shell_opened = true;
        Ok(shell)
    }

    /// Close the connection.
    async fn close(self) -> Result<()> {
        if !self.is_alive() {
            return Ok(());
        }
        self.session
            .disconnect(russh::Disconnect::ByApplication, "", "en")
            .await
            .map_err(TransportError::Ssh)?;
        debug!("disconnected from {}", self.config.socket_addr());
        Ok(())
    }
}

/// SSH client handler for russh.
struct SshHandler {
    host: String,
    port: u16,
}

impl client::Handler for SshHandler {
    type Error = russh::Error;

    // Device fleets are provisioned without known_hosts entries; every
    // server key is accepted.
    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        warn!(
            "accepting unverified {} host key for {}:{}",
            server_public_key.algorithm(),
            self.host,
            self.port
        );
        Ok(true)
    }
}
