//! # hwshell
//!
//! Async SSH command runner for Huawei VRP network devices.
//!
//! hwshell opens an interactive shell on a device, sends a command block,
//! pages through `---- More ----` output, classifies the result with a
//! table of error patterns and, on request, saves the configuration
//! through the `save` / `[Y/N]` confirmation dialogue.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hwshell::DeviceClientBuilder;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), hwshell::Error> {
//!     let client = DeviceClientBuilder::new("192.168.77.140")
//!         .username("admin")
//!         .password("secret")
//!         .build()?;
//!
//!     let cancel = CancellationToken::new();
//!     let execution = client
//!         .execute("system-view\nvlan 800\nquit", true, &cancel)
//!         .await?;
//!
//!     match execution.failure() {
//!         Some(failure) => eprintln!("failed: {failure}"),
//!         None => println!("{}", execution.response),
//!     }
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod driver;
pub mod error;
pub mod task;
pub mod transport;

// Re-export main types for convenience
pub use driver::{
    CommandExecutor, ConfigSaver, DeviceClient, DeviceClientBuilder, Execution, ExecutionFailure,
    Outcome, Response, SaveResult, Timings,
};
pub use error::Error;
pub use transport::{Session, SshConfig};
