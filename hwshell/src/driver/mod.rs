//! High-level driver for device interaction.
//!
//! The driver layer runs the command workflow ([`CommandExecutor`]) and the
//! save workflow ([`ConfigSaver`]) over a shell, and [`DeviceClient`] wires
//! them to an SSH session.

mod builder;
mod client;
mod executor;
pub(crate) mod response;
mod saver;
mod timing;

pub use builder::DeviceClientBuilder;
pub use client::{DeviceClient, is_read_only, run_on_shell};
pub use executor::CommandExecutor;
pub use response::{
    Execution, ExecutionFailure, Outcome, Response, SAVE_FAILED_MESSAGE, SaveResult,
};
pub use saver::{ConfigSaver, SaveState};
pub use timing::Timings;
