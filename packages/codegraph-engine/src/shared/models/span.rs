//! Source location types

use serde::{Deserialize, Serialize};

/// Single location in source code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

impl Location {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// Span in source code.
///
/// Invariant: start ≤ end lexicographically. Never mutated after
/// construction; builders intern spans through [`super::span_pool::SpanPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Span {
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
}

impl Span {
    pub fn new(start_line: u32, start_col: u32, end_line: u32, end_col: u32) -> Self {
        debug_assert!(
            (start_line, start_col) <= (end_line, end_col),
            "span start must not follow its end"
        );
        Self {
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }

    /// Whole-line span helper.
    pub fn line(line: u32) -> Self {
        Self::new(line, 0, line, u32::MAX)
    }

    pub fn zero() -> Self {
        Self::new(0, 0, 0, 0)
    }

    pub fn contains_line(&self, line: u32) -> bool {
        self.start_line <= line && line <= self.end_line
    }

    pub fn contains(&self, other: &Span) -> bool {
        (self.start_line, self.start_col) <= (other.start_line, other.start_col)
            && (other.end_line, other.end_col) <= (self.end_line, self.end_col)
    }

    pub fn line_count(&self) -> u32 {
        if self.end_line >= self.start_line {
            self.end_line - self.start_line + 1
        } else {
            0
        }
    }

    pub fn start(&self) -> Location {
        Location::new(self.start_line, self.start_col)
    }

    pub fn end(&self) -> Location {
        Location::new(self.end_line, self.end_col)
    }
}

impl Default for Span {
    fn default() -> Self {
        Self::zero()
    }
}
