//! Manuscript page-selection rules
//!
//! Scans interleave text pages with facing pages that carry no Hebrew column,
//! so only one parity of page index is processed. Some manuscripts break the
//! pattern; they get their own selector, looked up by manuscript id.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Page index parity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    Even,
    Odd,
}

impl Parity {
    pub fn of(index: u64) -> Self {
        if index % 2 == 0 {
            Parity::Even
        } else {
            Parity::Odd
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            Parity::Even => Parity::Odd,
            Parity::Odd => Parity::Even,
        }
    }
}

impl fmt::Display for Parity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Parity::Even => f.write_str("even"),
            Parity::Odd => f.write_str("odd"),
        }
    }
}

/// Why a page is left out
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum SkipReason {
    /// Index has the wrong parity
    Parity { index: u64, keep: Parity },
    /// File is excluded by name
    Excluded { file_name: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Parity { index, keep } => {
                write!(f, "index {index} is not {keep}")
            }
            SkipReason::Excluded { file_name } => write!(f, "{file_name} is excluded"),
        }
    }
}

/// Decision for one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Process,
    Skip(SkipReason),
}

impl Selection {
    pub fn is_skipped(&self) -> bool {
        matches!(self, Selection::Skip(_))
    }
}

/// Decides which pages of a manuscript are processed
pub trait PageSelector: Send + Sync {
    /// Rule name for logs
    fn name(&self) -> &'static str;

    fn select(&self, file_name: &str, index: u64) -> Selection;
}

/// Keep one parity of page index
#[derive(Debug, Clone, Copy)]
pub struct ParitySelector {
    keep: Parity,
}

impl ParitySelector {
    pub fn new(keep: Parity) -> Self {
        Self { keep }
    }
}

impl Default for ParitySelector {
    fn default() -> Self {
        Self::new(Parity::Even)
    }
}

impl PageSelector for ParitySelector {
    fn name(&self) -> &'static str {
        "parity"
    }

    fn select(&self, _file_name: &str, index: u64) -> Selection {
        parity_selection(index, self.keep)
    }
}

fn parity_selection(index: u64, keep: Parity) -> Selection {
    if Parity::of(index) == keep {
        Selection::Process
    } else {
        Selection::Skip(SkipReason::Parity { index, keep })
    }
}

/// Manuscript "john1": the text pages switch parity at page 9
///
/// Pages `000006.png` and `000008.png` are excluded outright. Known special
/// case of a single scan; other manuscripts use [`ParitySelector`].
#[derive(Debug, Clone, Copy)]
pub struct John1Selector {
    keep: Parity,
}

impl John1Selector {
    pub const MANUSCRIPT: &'static str = "john1";
    pub const SWITCH_INDEX: u64 = 9;
    pub const EXCLUDED: [&'static str; 2] = ["000006.png", "000008.png"];

    pub fn new(keep: Parity) -> Self {
        Self { keep }
    }
}

impl PageSelector for John1Selector {
    fn name(&self) -> &'static str {
        Self::MANUSCRIPT
    }

    fn select(&self, file_name: &str, index: u64) -> Selection {
        if Self::EXCLUDED.iter().any(|&name| name == file_name) {
            return Selection::Skip(SkipReason::Excluded {
                file_name: file_name.to_string(),
            });
        }
        if index < Self::SWITCH_INDEX {
            parity_selection(index, self.keep)
        } else {
            parity_selection(index, self.keep.flipped())
        }
    }
}

/// Selector for a manuscript id; `keep` is the parity processed by default
pub fn selector_for(manuscript: &str, keep: Parity) -> Box<dyn PageSelector> {
    if manuscript.eq_ignore_ascii_case(John1Selector::MANUSCRIPT) {
        Box::new(John1Selector::new(keep))
    } else {
        Box::new(ParitySelector::new(keep))
    }
}

/// Numeric page index from a file name such as `000009.png`
pub fn page_index(file_name: &str) -> Option<u64> {
    let stem = file_name.rsplit_once('.').map_or(file_name, |(stem, _)| stem);
    stem.parse().ok()
}
