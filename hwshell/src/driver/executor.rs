//! Single-command execution: send, read, paginate, classify.

use std::time::{Duration, Instant};

use log::{debug, trace};

use super::response::{Outcome, Response};
use super::timing::Timings;
use crate::channel::{
    CONTINUATION_KEY, PageBuffer, PatternCatalog, ShellIo, normalize_lines,
    strip_echo_and_prompt,
};
use crate::error::{ChannelError, DriverError, Error, Result};

/// Command sent without a line terminator so the device shows inline help.
const HELP_COMMAND: &str = "?";

/// Runs one command on an interactive shell and classifies its output.
#[derive(Debug, Clone, Copy)]
pub struct CommandExecutor<'a> {
    catalog: &'a PatternCatalog,
    timings: &'a Timings,
}

impl<'a> CommandExecutor<'a> {
    pub fn new(catalog: &'a PatternCatalog, timings: &'a Timings) -> Self {
        Self { catalog, timings }
    }

    /// Send `command` and collect its complete, de-paginated output.
    ///
    /// A device-side failure is reported through [`Outcome::Failure`], not
    /// as an `Err`; errors are reserved for the shell itself.
    pub async fn run<S: ShellIo>(&self, shell: &mut S, command: &str) -> Result<Response> {
        let start = Instant::now();
        let timings = self.timings;

        // Flush whatever prompt state is pending.
        shell.send("\n").await?;
        let mut stale = PageBuffer::new();
        read_page(shell, self.catalog, timings, &mut stale).await?;
        trace!("discarded {} stale bytes", stale.last_page().len());

        debug!("sending command {command:?}");
        if command == HELP_COMMAND {
            shell.send(command).await?;
        } else {
            shell.send(&format!("{command}\n")).await?;
        }

        let mut pages = PageBuffer::new();
        read_page(shell, self.catalog, timings, &mut pages).await?;

        while pages.wants_more() {
            if pages.pages() >= timings.max_pages {
                return Err(DriverError::PaginationLimit {
                    pages: pages.pages(),
                }
                .into());
            }
            shell.send(CONTINUATION_KEY).await?;
            tokio::time::sleep(timings.continuation_delay).await;
            read_page(shell, self.catalog, timings, &mut pages).await?;
        }

        let stderr = String::from_utf8_lossy(&shell.take_stderr(timings.buffer_size)).into_owned();
        let stdout = pages.assemble(self.catalog);

        Ok(self.classify(command, stdout, stderr, pages.pages(), start.elapsed()))
    }

    /// Build the response from the assembled output.
    fn classify(
        &self,
        command: &str,
        stdout: String,
        stderr: String,
        pages: usize,
        elapsed: Duration,
    ) -> Response {
        let (stdout, outcome) = match self.catalog.error_marker(&stdout) {
            Some(marker) => {
                debug!("command {command:?} failed: matched error marker {marker}");
                (normalize_lines(&stdout), Outcome::Failure { marker })
            }
            None => (strip_echo_and_prompt(&stdout), Outcome::Success),
        };

        debug!("command {command:?} completed in {elapsed:?} ({pages} pages)");

        Response {
            command: command.to_string(),
            stdout,
            stderr,
            outcome,
            pages,
            elapsed,
        }
    }
}

/// Read one page into `pages`: the first read starts the page, further
/// reads extend it until it ends at a prompt or a pager banner.
///
/// Bounded by `read_timeout`. Output that never reaches a prompt is kept
/// as it is once the device goes silent; a device that sends nothing at
/// all fails with `ChannelError::Timeout`.
pub(crate) async fn read_page<S: ShellIo>(
    shell: &mut S,
    catalog: &PatternCatalog,
    timings: &Timings,
    pages: &mut PageBuffer,
) -> Result<()> {
    let deadline = Instant::now() + timings.read_timeout;
    pages.push(&shell.read(timings.buffer_size, timings.read_timeout).await?);

    while !pages.page_complete(catalog) {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            debug!("no prompt within {:?}, keeping partial page", timings.read_timeout);
            break;
        }
        match shell.read(timings.buffer_size, remaining).await {
            Ok(data) => pages.extend(&data),
            Err(Error::Channel(ChannelError::Timeout(_))) => {
                debug!("device went silent before a prompt, keeping partial page");
                break;
            }
            Err(e) => return Err(e),
        }
    }
    Ok(())
}
