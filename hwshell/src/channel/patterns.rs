//! Prompt, error and pager patterns for VRP consoles.
//!
//! The catalog is pure data: it is compiled once and shared read-only by
//! every client through [`PatternCatalog::global`].

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

/// Substring that marks a pager banner on the tail line of a buffer.
pub const MORE_MARKER: &str = "- More -";

/// Key sent to request the next page of paginated output.
pub const CONTINUATION_KEY: &str = "\n";

/// Substring the device prints when `save` completed.
pub const SAVE_SUCCESS_MARKER: &str = "successfully";

static CATALOG: Lazy<PatternCatalog> = Lazy::new(PatternCatalog::vrp);

/// Trait for prompt matching - regex by default.
pub trait PromptMatcher: Send + Sync {
    /// Returns byte offset where match ends, or None if no match.
    fn find_match(&self, data: &str) -> Option<usize>;

    /// Check if the data matches the pattern.
    fn is_match(&self, data: &str) -> bool {
        self.find_match(data).is_some()
    }
}

impl PromptMatcher for Regex {
    fn find_match(&self, data: &str) -> Option<usize> {
        self.find(data).map(|m| m.end())
    }
}

/// Any-of matcher over a set of prompt patterns.
impl PromptMatcher for [Regex] {
    fn find_match(&self, data: &str) -> Option<usize> {
        self.iter().find_map(|pattern| pattern.find_match(data))
    }
}

/// Compiled pattern vocabulary for one device family.
#[derive(Debug, Clone)]
pub struct PatternCatalog {
    /// Prompts that mean the shell is back at a stable prompt.
    /// The first entry is the top-level (user view) prompt.
    terminators: Vec<Regex>,

    /// Error markers keyed by a short name, in declaration order.
    error_markers: IndexMap<&'static str, Regex>,

    /// Pager banner text, including its leading padding.
    pager_banner: Regex,

    /// Cursor-left / blank / cursor-left sequence the pager emits to wipe
    /// its banner, plus any stray cursor-left moves.
    screen_control: Regex,
}

impl PatternCatalog {
    /// The shared VRP catalog.
    pub fn global() -> &'static PatternCatalog {
        &CATALOG
    }

    /// Build the VRP catalog.
    ///
    /// Every pattern is a literal known to compile.
    fn vrp() -> Self {
        let terminators = vec![
            // <HUAWEI>
            Regex::new(r"[\r\n]?<.+>\s*$").unwrap(),
            // [HUAWEI] / [~HUAWEI-vlan10]
            Regex::new(r"[\r\n]?\[.+\]\s*$").unwrap(),
        ];

        let error_markers = [
            ("percent_error", r"% ?Error: "),
            ("percent_word", r"(?m)^% \w+"),
            ("bad_secret", r"% ?Bad secret"),
            ("invalid_input", r"(?i)invalid input"),
            ("incomplete_command", r"(?i)(?:incomplete|ambiguous) command"),
            ("connection_timed_out", r"(?i)connection timed out"),
            ("not_found", r"(?i)[^\r\n]+ not found"),
            ("returned_error_code", r"'[^']+' +returned error code: ?\d+"),
            ("syntax_error", r"syntax error"),
            ("unknown_command", r"unknown command"),
            ("error_code", r"(?i)Error\[\d+\]: "),
            ("error", r"(?i)Error:"),
        ]
        .into_iter()
        .map(|(name, pattern)| (name, Regex::new(pattern).unwrap()))
        .collect();

        Self {
            terminators,
            error_markers,
            pager_banner: Regex::new(r" *-+ ?More ?-+").unwrap(),
            screen_control: Regex::new(r"\x1b\[\d+D *\x1b\[\d+D|\x1b\[\d+D").unwrap(),
        }
    }

    /// The top-level (user view) prompt pattern.
    pub fn top_level(&self) -> &Regex {
        &self.terminators[0]
    }

    /// Whether the text ends at any known prompt (user view or a
    /// system/sub-view `[...]`).
    pub fn at_prompt(&self, text: &str) -> bool {
        self.terminators.as_slice().is_match(text)
    }

    /// Name of the first error marker found in `text`, if any.
    ///
    /// Markers are independent; declaration order only decides which name
    /// is reported when several match.
    pub fn error_marker(&self, text: &str) -> Option<&'static str> {
        self.error_markers
            .iter()
            .find(|(_, pattern)| pattern.is_match(text))
            .map(|(name, _)| *name)
    }

    /// Remove pager banners and pager erase sequences from `text`.
    pub fn strip_pager(&self, text: &str) -> String {
        let text = self.pager_banner.replace_all(text, "");
        self.screen_control.replace_all(&text, "").into_owned()
    }
}
