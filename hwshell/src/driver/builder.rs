//! Builder for creating device clients.

use std::time::Duration;

use secrecy::SecretString;

use super::client::DeviceClient;
use super::timing::Timings;
use crate::error::{DriverError, Result};
use crate::transport::SshConfig;

/// Builder for constructing device clients.
///
/// # Example
///
/// ```rust,no_run
/// use hwshell::DeviceClientBuilder;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), hwshell::Error> {
/// let client = DeviceClientBuilder::new("192.168.77.140")
///     .username("admin")
///     .password("secret")
///     .build()?;
///
/// let execution = client
///     .execute("display version", false, &CancellationToken::new())
///     .await?;
/// println!("{}", execution.response);
/// # Ok(())
/// # }
/// ```
pub struct DeviceClientBuilder {
    host: String,
    port: u16,
    username: Option<String>,
    password: SecretString,
    timeout: Duration,
    terminal_width: u32,
    terminal_height: u32,
    timings: Timings,
}

impl DeviceClientBuilder {
    /// Create a new builder for the specified host.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 22,
            username: None,
            password: SecretString::from(""),
            timeout: Duration::from_secs(30),
            terminal_width: 80,
            terminal_height: 24,
            timings: Timings::default(),
        }
    }

    /// Set the SSH port (default: 22).
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the username for authentication.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set the password for authentication.
    pub fn password(mut self, password: impl Into<SecretString>) -> Self {
        self.password = password.into();
        self
    }

    /// Set the connection timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set terminal dimensions.
    pub fn terminal_size(mut self, width: u32, height: u32) -> Self {
        self.terminal_width = width;
        self.terminal_height = height;
        self
    }

    /// Set the settle delays and bounds.
    pub fn timings(mut self, timings: Timings) -> Self {
        self.timings = timings;
        self
    }

    /// Build the client.
    ///
    /// This does not connect; every `execute` call opens its own session.
    pub fn build(self) -> Result<DeviceClient> {
        let username = self
            .username
            .filter(|name| !name.is_empty())
            .ok_or_else(|| DriverError::InvalidConfig {
                message: "Username is required".to_string(),
            })?;

        if self.host.is_empty() {
            return Err(DriverError::InvalidConfig {
                message: "Host is required".to_string(),
            }
            .into());
        }

        let ssh_config = SshConfig {
            host: self.host,
            port: self.port,
            username,
            password: self.password,
            timeout: self.timeout,
            terminal_width: self.terminal_width,
            terminal_height: self.terminal_height,
        };

        Ok(DeviceClient::new(ssh_config, self.timings))
    }
}
