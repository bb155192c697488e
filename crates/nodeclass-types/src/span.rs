use serde::{Deserialize, Serialize};
use std::fmt;

/// Location inside a single-line expression.
///
/// Columns are 1-based and inclusive, counted in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    #[serde(rename = "column")]
    pub start_col: u32,
    #[serde(rename = "end_column")]
    pub end_col: u32,
}

impl Span {
    /// Create a new span.
    pub fn new(start_col: u32, end_col: u32) -> Self {
        Self { start_col, end_col }
    }

    /// Create a zero-width span at a single position.
    pub fn point(col: u32) -> Self {
        Self::new(col, col)
    }

    /// Merge two spans into one that covers both.
    pub fn merge(self, other: Span) -> Span {
        Span::new(
            self.start_col.min(other.start_col),
            self.end_col.max(other.end_col),
        )
    }

    /// Extract the covered text from `source`.
    pub fn slice<'a>(&self, source: &'a str) -> &'a str {
        let start = (self.start_col as usize).saturating_sub(1);
        let len = (self.end_col.saturating_sub(self.start_col) as usize) + 1;
        let begin = source
            .char_indices()
            .nth(start)
            .map(|(i, _)| i)
            .unwrap_or(source.len());
        let end = source[begin..]
            .char_indices()
            .nth(len)
            .map(|(i, _)| begin + i)
            .unwrap_or(source.len());
        &source[begin..end]
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "col {}", self.start_col)
    }
}
