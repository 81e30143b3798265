//! Save-configuration workflow.
//!
//! VRP only accepts `save` from user view (`<HUAWEI>`), so the saver first
//! backs out of any nested view with `quit`, then answers the `[Y/N]`
//! confirmation and checks the device's report.
//!
//! ```text
//!  Probing ──top-level──► TopLevel ──save──► Saving ──y──► Confirming ──read──► Done
//!     │                      ▲
//!     └──nested──► Nested ───┘ (quit, at most `max_quit_attempts` times)
//! ```

use log::{debug, trace};

use super::executor::read_page;
use super::response::SaveResult;
use super::timing::Timings;
use crate::channel::{PageBuffer, PatternCatalog, SAVE_SUCCESS_MARKER, ShellIo};
use crate::error::{DriverError, Result};

/// States of the save workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveState {
    /// Prompt depth not yet known.
    Probing,

    /// Below user view; `quits` commands sent so far.
    Nested { quits: usize },

    /// At the user-view prompt.
    TopLevel,

    /// `save` sent, confirmation pending.
    Saving,

    /// Confirmation sent, waiting for the device to finish.
    Confirming,

    /// Finished.
    Done(SaveResult),
}

/// Drives a shell through the save-and-confirm sequence.
#[derive(Debug, Clone, Copy)]
pub struct ConfigSaver<'a> {
    catalog: &'a PatternCatalog,
    timings: &'a Timings,
}

impl<'a> ConfigSaver<'a> {
    pub fn new(catalog: &'a PatternCatalog, timings: &'a Timings) -> Self {
        Self { catalog, timings }
    }

    /// Run the workflow to completion.
    pub async fn run<S: ShellIo>(&self, shell: &mut S) -> Result<SaveResult> {
        let mut state = SaveState::Probing;
        loop {
            state = match state {
                SaveState::Done(result) => {
                    debug!("save finished with rc {}", result.rc);
                    return Ok(result);
                }
                state => self.step(shell, state).await?,
            };
            trace!("save state -> {state:?}");
        }
    }

    /// Perform the action of `state` and return the next state.
    pub async fn step<S: ShellIo>(&self, shell: &mut S, state: SaveState) -> Result<SaveState> {
        let timings = self.timings;
        let next = match state {
            SaveState::Probing => {
                shell.send("\n").await?;
                let buffer = self.read_prompt(shell).await?;
                self.depth(&buffer, 0)
            }
            SaveState::Nested { quits } => {
                if quits >= timings.max_quit_attempts {
                    return Err(DriverError::TopLevelNotReached { attempts: quits }.into());
                }
                shell.send("quit\n").await?;
                let buffer = self.read_prompt(shell).await?;
                self.depth(&buffer, quits + 1)
            }
            SaveState::TopLevel => {
                shell.send("save\n").await?;
                tokio::time::sleep(timings.save_prompt_delay).await;
                SaveState::Saving
            }
            SaveState::Saving => {
                shell.send("y\n").await?;
                tokio::time::sleep(timings.save_settle).await;
                SaveState::Confirming
            }
            SaveState::Confirming => {
                let output = self.read_text(shell).await?;
                let rc = if output.contains(SAVE_SUCCESS_MARKER) { 0 } else { 1 };
                SaveState::Done(SaveResult { rc, output })
            }
            done @ SaveState::Done(_) => done,
        };
        Ok(next)
    }

    /// Classify a buffer as top-level or still nested.
    fn depth(&self, buffer: &str, quits: usize) -> SaveState {
        if self.catalog.top_level().is_match(buffer) {
            SaveState::TopLevel
        } else {
            SaveState::Nested { quits }
        }
    }

    /// Read up to the next prompt.
    async fn read_prompt<S: ShellIo>(&self, shell: &mut S) -> Result<String> {
        let mut page = PageBuffer::new();
        read_page(shell, self.catalog, self.timings, &mut page).await?;
        Ok(page.last_page().into_owned())
    }

    async fn read_text<S: ShellIo>(&self, shell: &mut S) -> Result<String> {
        let data = shell
            .read(self.timings.buffer_size, self.timings.read_timeout)
            .await?;
        Ok(String::from_utf8_lossy(&data).into_owned())
    }
}
