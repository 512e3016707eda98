/*!
# Source position types (Position, LineSpan)

Location types shared by the lexer, the AST and the cost attribution.
*/

use serde::{Deserialize, Serialize};
use std::fmt;

/// Position in source code (1-based line and column, byte offset)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl Position {
    pub fn new(line: usize, column: usize, offset: usize) -> Self {
        Self { line, column, offset }
    }

    pub fn start() -> Self {
        Self::new(1, 1, 0)
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::start()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Inclusive range of source lines covered by a statement.
///
/// Both ends are optional so that synthesized statements (for example the
/// negated guard of a `repeat ... until`) can exist without a location.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineSpan {
    pub line_start: Option<usize>,
    pub line_end: Option<usize>,
}

impl LineSpan {
    pub fn new(line_start: usize, line_end: usize) -> Self {
        Self {
            line_start: Some(line_start),
            line_end: Some(line_end.max(line_start)),
        }
    }

    pub fn unknown() -> Self {
        Self::default()
    }

    /// True when `line` lies strictly after the first line and not after the last one.
    pub fn encloses_body_line(&self, line: usize) -> bool {
        match (self.line_start, self.line_end) {
            (Some(start), Some(end)) => start < line && line <= end,
            _ => false,
        }
    }
}

impl fmt::Display for LineSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.line_start, self.line_end) {
            (Some(start), Some(end)) if start == end => write!(f, "line {}", start),
            (Some(start), Some(end)) => write!(f, "lines {}-{}", start, end),
            _ => write!(f, "<unknown>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_span_body_membership() {
        let span = LineSpan::new(3, 7);
        assert!(!span.encloses_body_line(3));
        assert!(span.encloses_body_line(4));
        assert!(span.encloses_body_line(7));
        assert!(!span.encloses_body_line(8));
        assert!(!LineSpan::unknown().encloses_body_line(1));
    }

    #[test]
    fn display_forms() {
        assert_eq!(Position::new(2, 5, 17).to_string(), "2:5");
        assert_eq!(LineSpan::new(4, 4).to_string(), "line 4");
        assert_eq!(LineSpan::new(4, 9).to_string(), "lines 4-9");
    }
}
