//! Settle delays and bounds for driving a VRP console.
//!
//! These encode observed device latency, not protocol guarantees; firmware
//! that answers slower needs larger values.

use std::time::Duration;

use crate::channel::PtyConfig;

/// Timing and bound configuration shared by the command and save workflows.
#[derive(Debug, Clone)]
pub struct Timings {
    /// Quiet interval that ends a read burst (the old 100 ms poll step).
    pub poll_interval: Duration,

    /// Longest wait for any output after a send.
    pub read_timeout: Duration,

    /// Delay after sending the continuation key before reading the next page.
    pub continuation_delay: Duration,

    /// Delay between `save` and the `y` confirmation.
    pub save_prompt_delay: Duration,

    /// Delay after the confirmation before reading the save result.
    pub save_settle: Duration,

    /// Maximum bytes handed out by a single read.
    pub buffer_size: usize,

    /// Maximum pages consumed for one command.
    pub max_pages: usize,

    /// Maximum `quit` commands sent while looking for the top-level prompt.
    pub max_quit_attempts: usize,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            read_timeout: Duration::from_secs(30),
            continuation_delay: Duration::from_millis(100),
            save_prompt_delay: Duration::from_millis(100),
            save_settle: Duration::from_secs(3),
            buffer_size: 4096,
            max_pages: 1000,
            max_quit_attempts: 8,
        }
    }
}

impl Timings {
    /// Zero delays, default bounds. For scripted shells that answer at once.
    pub fn immediate() -> Self {
        Self {
            poll_interval: Duration::ZERO,
            continuation_delay: Duration::ZERO,
            save_prompt_delay: Duration::ZERO,
            save_settle: Duration::ZERO,
            ..Self::default()
        }
    }

    /// PTY read configuration derived from these timings.
    pub fn pty_config(&self) -> PtyConfig {
        PtyConfig {
            quiet_period: self.poll_interval,
            ..PtyConfig::default()
        }
    }
}
