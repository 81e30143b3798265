//! Device client: one session, one command, optional save.

use std::future::Future;

use log::{debug, info, warn};
use tokio_util::sync::CancellationToken;

use super::executor::CommandExecutor;
use super::response::Execution;
use super::saver::ConfigSaver;
use super::timing::Timings;
use crate::channel::{PatternCatalog, ShellIo};
use crate::error::{DriverError, Result};
use crate::transport::{Session, SshConfig, SshTransport};

/// Runs a command on a device over a fresh SSH session.
///
/// Every call to [`execute`](Self::execute) opens its own session and
/// closes it before returning, whatever the outcome. Clients share no
/// mutable state and may run concurrently.
#[derive(Debug, Clone)]
pub struct DeviceClient {
    ssh_config: SshConfig,
    timings: Timings,
    catalog: &'static PatternCatalog,
}

impl DeviceClient {
    /// Create a client. See [`DeviceClientBuilder`](super::DeviceClientBuilder).
    pub fn new(ssh_config: SshConfig, timings: Timings) -> Self {
        Self {
            ssh_config,
            timings,
            catalog: PatternCatalog::global(),
        }
    }

    /// Get the SSH configuration.
    pub fn ssh_config(&self) -> &SshConfig {
        &self.ssh_config
    }

    /// Get the timing configuration.
    pub fn timings(&self) -> &Timings {
        &self.timings
    }

    /// Connect, run `command`, optionally save the configuration, disconnect.
    ///
    /// Connection, authentication and shell errors are returned as `Err`.
    /// A rejected command or an unconfirmed save is reported through
    /// [`Execution::failure`]. Triggering `cancel` aborts the workflow,
    /// closes the session and returns `DriverError::Cancelled`.
    pub async fn execute(
        &self,
        command: &str,
        save: bool,
        cancel: &CancellationToken,
    ) -> Result<Execution> {
        let addr = self.ssh_config.socket_addr();
        info!("executing on {addr}");

        let transport =
            cancellable(cancel, SshTransport::connect(self.ssh_config.clone())).await?;

        self.run_session(transport, command, save, cancel).await
    }

    /// Run the workflow on `session`, then close it whatever the outcome.
    async fn run_session<T: Session>(
        &self,
        mut session: T,
        command: &str,
        save: bool,
        cancel: &CancellationToken,
    ) -> Result<Execution> {
        let result = cancellable(cancel, self.drive(&mut session, command, save)).await;

        if let Err(e) = session.close().await {
            warn!("error closing session to {}: {e}", self.ssh_config.socket_addr());
        }
        result
    }

    /// Open the shell and run the workflow; the caller closes the session.
    async fn drive<T: Session>(
        &self,
        session: &mut T,
        command: &str,
        save: bool,
    ) -> Result<Execution> {
        let mut shell = session.open_shell(self.timings.pty_config()).await?;
        let result = run_on_shell(&mut shell, self.catalog, &self.timings, command, save).await;
        if let Err(e) = shell.close().await {
            debug!("error closing shell: {e}");
        }
        result
    }
}

/// Run the command (and the save sequence, if requested) on an open shell.
///
/// Saving is only attempted when the command succeeded.
pub async fn run_on_shell<S: ShellIo>(
    shell: &mut S,
    catalog: &PatternCatalog,
    timings: &Timings,
    command: &str,
    save: bool,
) -> Result<Execution> {
    let response = CommandExecutor::new(catalog, timings)
        .run(shell, command)
        .await?;
    let changed = response.is_success() && !is_read_only(command);

    let saved = if save && response.is_success() {
        Some(ConfigSaver::new(catalog, timings).run(shell).await?)
    } else {
        None
    };

    Ok(Execution {
        response,
        changed,
        saved,
    })
}

/// Whether `command` only queries state.
///
/// True when every non-empty line is `?` or starts with `display` or an
/// abbreviation of it VRP accepts (`dis`, `disp`, ...).
pub fn is_read_only(command: &str) -> bool {
    let mut lines = command
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .peekable();

    if lines.peek().is_none() {
        return false;
    }

    lines.all(|line| {
        let word = line.split_whitespace().next().unwrap_or_default();
        word == "?" || (word.len() >= 3 && "display".starts_with(&word.to_ascii_lowercase()))
    })
}

/// Run `work` unless `cancel` fires first.
async fn cancellable<T>(
    cancel: &CancellationToken,
    work: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            warn!("operation cancelled");
            Err(DriverError::Cancelled.into())
        }
        result = work => result,
    }
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;
    use std::time::Duration;

    use super::*;
    use crate::channel::scripted::{ScriptedSession, ScriptedShell};
    use crate::driver::response::{ExecutionFailure, Outcome, SAVE_FAILED_MESSAGE};
    use crate::error::{ChannelError, Error, TransportError};
    use tokio_test::{assert_err, assert_ok};

    async fn run(shell: &mut ScriptedShell, command: &str, save: bool) -> Result<Execution> {
        let timings = Timings::immediate();
        run_on_shell(shell, PatternCatalog::global(), &timings, command, save).await
    }

    #[tokio::test]
    async fn test_display_command() {
        let mut shell = ScriptedShell::new(["<hostname>", "<hostname>\r\nVersion 1.0\r\n<hostname>"]);

        let execution = assert_ok!(run(&mut shell, "display version", false).await);

        assert_eq!(execution.response.stdout, "Version 1.0");
        assert_eq!(execution.response.rc(), 0);
        assert!(!execution.changed);
        assert!(execution.saved.is_none());
        assert_eq!(execution.failure(), None);
    }

    #[tokio::test]
    async fn test_rejected_command() {
        let mut shell = ScriptedShell::new(["[~hostname]", "Error: invalid input\r\n[~hostname]"]);

        let execution = assert_ok!(run(&mut shell, "vlan 999", true).await);

        assert_eq!(execution.response.rc(), 1);
        assert_eq!(execution.response.stdout, "Error: invalid input\n[~hostname]");
        assert!(!execution.changed);
        assert!(execution.saved.is_none());
        assert_eq!(shell.count_sent("save\n"), 0);
        assert_eq!(
            execution.failure(),
            Some(ExecutionFailure::Command {
                message: "Error: invalid input\n[~hostname]".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_late_error_blocks_save() {
        let mut shell = ScriptedShell::new([
            "[~HUAWEI]",
            "vlan 5000\r\n",
            "Error: Wrong parameter found at '^' position.\r\n[~HUAWEI]",
            "\r\n<HUAWEI>",
            "Configuration file had been saved successfully\r\n<HUAWEI>",
        ]);

        let execution = assert_ok!(run(&mut shell, "vlan 5000", true).await);

        assert!(!execution.response.is_success());
        assert_eq!(execution.response.outcome, Outcome::Failure { marker: "error" });
        assert!(!execution.changed);
        assert!(execution.saved.is_none());
        assert_eq!(shell.sent(), ["\n", "vlan 5000\n"]);
        assert_eq!(shell.remaining(), 2);
    }

    #[tokio::test]
    async fn test_save_confirmed() {
        let mut shell = ScriptedShell::new([
            "[~hostname]",
            "vlan 800\r\n[~hostname-vlan800]",
            "\r\n[~hostname-vlan800]",
            "quit\r\n[~hostname]",
            "quit\r\n<hostname>",
            "Configuration saved successfully",
        ]);

        let execution = assert_ok!(run(&mut shell, "vlan 800", true).await);

        assert!(execution.changed);
        assert_eq!(execution.saved.as_ref().map(|s| s.rc), Some(0));
        assert_eq!(execution.failure(), None);
    }

    #[tokio::test]
    async fn test_save_unconfirmed() {
        let mut shell = ScriptedShell::new([
            "<hostname>",
            "undo info-center enable\r\n<hostname>",
            "<hostname>",
            "Save failed, disk full",
        ]);

        let execution = assert_ok!(run(&mut shell, "undo info-center enable", true).await);

        assert!(execution.changed);
        assert_eq!(execution.failure(), Some(ExecutionFailure::SaveConfig));
        assert_eq!(
            execution.failure().map(|f| f.to_string()).as_deref(),
            Some(SAVE_FAILED_MESSAGE)
        );
    }

    #[test]
    fn test_is_read_only() {
        assert!(is_read_only("display version"));
        assert!(is_read_only("dis cur"));
        assert!(is_read_only("DISPLAY clock"));
        assert!(is_read_only("?"));
        assert!(is_read_only("display version\ndisplay clock\n"));
        assert!(!is_read_only("di"));
        assert!(!is_read_only("system-view\nvlan 800"));
        assert!(!is_read_only("display version\nsave"));
        assert!(!is_read_only(""));
    }

    #[tokio::test]
    async fn test_cancelled_before_work() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = assert_err!(cancellable(&cancel, std::future::pending::<Result<()>>()).await);

        assert!(matches!(err, Error::Driver(DriverError::Cancelled)));
    }

    #[tokio::test]
    async fn test_cancel_interrupts_pending_work() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });

        let err = assert_err!(cancellable(&cancel, std::future::pending::<Result<()>>()).await);

        assert!(matches!(err, Error::Driver(DriverError::Cancelled)));
    }

    fn client() -> DeviceClient {
        DeviceClient::new(
            SshConfig::new("192.0.2.1", "admin", "secret"),
            Timings::immediate(),
        )
    }

    #[tokio::test]
    async fn test_session_closed_after_success() {
        let session = ScriptedSession::new(ScriptedShell::new([
            "<hostname>",
            "display version\r\nVersion 1.0\r\n<hostname>",
        ]));
        let closed = session.closed();

        let execution = assert_ok!(
            client()
                .run_session(session, "display version", false, &CancellationToken::new())
                .await
        );

        assert_eq!(execution.response.stdout, "Version 1.0");
        assert!(closed.shell());
        assert!(closed.session());
    }

    #[tokio::test]
    async fn test_session_closed_after_command_error() {
        let session = ScriptedSession::new(ScriptedShell::new([
            "[~hostname]",
            "Error: invalid input\r\n[~hostname]",
        ]));
        let closed = session.closed();

        let execution = assert_ok!(
            client()
                .run_session(session, "vlan 999", true, &CancellationToken::new())
                .await
        );

        assert!(matches!(execution.failure(), Some(ExecutionFailure::Command { .. })));
        assert!(closed.shell());
        assert!(closed.session());
    }

    #[tokio::test]
    async fn test_session_closed_after_save_failure() {
        let session = ScriptedSession::new(ScriptedShell::new([
            "<hostname>",
            "undo info-center enable\r\n<hostname>",
            "<hostname>",
            "Save failed, disk full",
        ]));
        let closed = session.closed();

        let execution = assert_ok!(
            client()
                .run_session(session, "undo info-center enable", true, &CancellationToken::new())
                .await
        );

        assert_eq!(execution.failure(), Some(ExecutionFailure::SaveConfig));
        assert!(closed.shell());
        assert!(closed.session());
    }

    #[tokio::test]
    async fn test_session_closed_after_workflow_error() {
        let session = ScriptedSession::new(ScriptedShell::new(["<hostname>"]));
        let closed = session.closed();

        let err = assert_err!(
            client()
                .run_session(session, "display clock", false, &CancellationToken::new())
                .await
        );

        assert!(matches!(err, Error::Channel(ChannelError::Timeout(_))));
        assert!(closed.shell());
        assert!(closed.session());
    }

    #[tokio::test]
    async fn test_session_closed_when_shell_refused() {
        let session = ScriptedSession::refusing("shell request refused");
        let closed = session.closed();

        let err = assert_err!(
            client()
                .run_session(session, "display version", false, &CancellationToken::new())
                .await
        );

        assert!(err.is_shell_open());
        assert!(closed.session());
    }

    #[tokio::test]
    async fn test_session_closed_after_cancel() {
        let session = ScriptedSession::new(ScriptedShell::new(["<hostname>"]).stalled());
        let closed = session.closed();
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });

        let err = assert_err!(
            client()
                .run_session(session, "display clock", false, &cancel)
                .await
        );

        assert!(matches!(err, Error::Driver(DriverError::Cancelled)));
        assert!(closed.session());
    }

    #[tokio::test]
    async fn test_unreachable_host() {
        let port = {
            let listener = assert_ok!(TcpListener::bind("127.0.0.1:0"));
            assert_ok!(listener.local_addr()).port()
        };
        let mut config = SshConfig::new("127.0.0.1", "admin", "secret");
        config.port = port;
        config.timeout = Duration::from_secs(5);
        let client = DeviceClient::new(config, Timings::immediate());

        let err = assert_err!(
            client
                .execute("display version", false, &CancellationToken::new())
                .await
        );

        assert!(err.is_connection());
        assert!(matches!(
            err,
            Error::Transport(TransportError::ConnectionFailed { .. })
        ));
    }
}
