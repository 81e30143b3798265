//! Accumulator for paginated command output.
//!
//! VRP has no end-of-response marker. A page is complete once its tail line
//! is a prompt or a pager banner; a single read may stop short of either
//! when the device pauses, so reads are appended to the current page until
//! it completes. Only the tail line of the latest page decides whether
//! another page must be requested.

use std::borrow::Cow;

use super::patterns::{MORE_MARKER, PatternCatalog};

/// Buffer for accumulating the pages of one command's output.
#[derive(Debug, Default)]
pub struct PageBuffer {
    /// Raw bytes of every buffer read so far, in order.
    buffer: Vec<u8>,

    /// Start offset of the current (latest) page.
    last_start: usize,

    /// Number of pages started.
    pages: usize,
}

impl PageBuffer {
    /// Create an empty page buffer.
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(4096),
            last_start: 0,
            pages: 0,
        }
    }

    /// Start a new page with one buffer read from the shell.
    pub fn push(&mut self, data: &[u8]) {
        self.last_start = self.buffer.len();
        self.buffer.extend_from_slice(data);
        self.pages += 1;
    }

    /// Append a further read to the current page.
    pub fn extend(&mut self, data: &[u8]) {
        if self.pages == 0 {
            self.push(data);
        } else {
            self.buffer.extend_from_slice(data);
        }
    }

    /// Text of the current page.
    pub fn last_page(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.buffer[self.last_start..])
    }

    /// The last line of the current page.
    ///
    /// Lines are separated by `\n`; a trailing `\r` is kept, it never
    /// affects marker detection.
    pub fn tail_line(&self) -> Cow<'_, str> {
        let last = &self.buffer[self.last_start..];
        let start = memchr::memrchr(b'\n', last).map_or(0, |pos| pos + 1);
        String::from_utf8_lossy(&last[start..])
    }

    /// Whether the current page stopped at a pager banner.
    pub fn wants_more(&self) -> bool {
        self.pages > 0 && self.tail_line().contains(MORE_MARKER)
    }

    /// Whether the current page ends at a prompt or a pager banner.
    pub fn page_complete(&self, catalog: &PatternCatalog) -> bool {
        self.pages > 0 && (self.wants_more() || catalog.at_prompt(&self.tail_line()))
    }

    /// Number of pages started so far.
    pub fn pages(&self) -> usize {
        self.pages
    }

    /// Concatenate all pages with the pager's banners and erase
    /// sequences removed.
    pub fn assemble(&self, catalog: &PatternCatalog) -> String {
        catalog.strip_pager(&String::from_utf8_lossy(&self.buffer))
    }
}

/// Split device output into lines, dropping the `\r` of `\r\n` endings.
pub fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split('\n').map(|line| line.strip_suffix('\r').unwrap_or(line))
}

/// Re-join device output with `\n` line endings.
pub fn normalize_lines(text: &str) -> String {
    split_lines(text).collect::<Vec<_>>().join("\n")
}

/// Drop the first line (command echo) and the last line (trailing prompt).
pub fn strip_echo_and_prompt(text: &str) -> String {
    let lines: Vec<&str> = split_lines(text).collect();
    if lines.len() <= 2 {
        return String::new();
    }
    lines[1..lines.len() - 1].join("\n")
}
