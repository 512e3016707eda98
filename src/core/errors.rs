/*!
# Error System

Fatal errors are `thiserror` enums propagated with `?`. Non-fatal problems
(an expression that could not be interpreted, a recurrence that matches no
known shape, an opaque statement) never abort an analysis: they are recorded
as [`Degradation`] notes on the produced value and lower its [`Confidence`].
*/

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::position::Position;

/// Grammar violation reported by the parser. No recovery is attempted.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{message} at {position}")]
pub struct ParseError {
    pub message: String,
    pub position: Position,
    pub expected: Vec<String>,
    pub found: Option<String>,
}

impl ParseError {
    pub fn new(message: impl Into<String>, position: Position) -> Self {
        Self {
            message: message.into(),
            position,
            expected: Vec::new(),
            found: None,
        }
    }

    pub fn with_expected(mut self, expected: impl Into<String>) -> Self {
        self.expected.push(expected.into());
        self
    }

    pub fn with_found(mut self, found: impl Into<String>) -> Self {
        self.found = Some(found.into());
        self
    }
}

/// Fatal analysis errors
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Unrecognized expression: {0}")]
    UnrecognizedExpression(String),

    #[error("Unclassifiable recurrence: {0}")]
    UnclassifiableRecurrence(String),

    #[error("Function not found: {0}")]
    UnknownFunction(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// Kinds of non-fatal degradation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradationKind {
    /// A sub-expression was replaced by an opaque symbol
    UnrecognizedExpression,
    /// A summation had no closed form and was kept symbolically
    UnresolvedSummation,
    /// A recurrence did not match any canonical class
    UnclassifiableRecurrence,
    /// A statement without a cost rule was charged a unit cost
    UnhandledNode,
}

impl fmt::Display for DegradationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DegradationKind::UnrecognizedExpression => write!(f, "unrecognized expression"),
            DegradationKind::UnresolvedSummation => write!(f, "unresolved summation"),
            DegradationKind::UnclassifiableRecurrence => write!(f, "unclassifiable recurrence"),
            DegradationKind::UnhandledNode => write!(f, "unhandled node"),
        }
    }
}

/// Observable marker attached to a best-effort result
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Degradation {
    pub kind: DegradationKind,
    pub detail: String,
}

impl Degradation {
    pub fn new(kind: DegradationKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for Degradation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.detail)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Exact,
    BestEffort,
}

impl Confidence {
    pub fn from_notes(notes: &[Degradation]) -> Self {
        if notes.is_empty() {
            Confidence::Exact
        } else {
            Confidence::BestEffort
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::Exact => write!(f, "exact"),
            Confidence::BestEffort => write!(f, "best-effort"),
        }
    }
}

/// Ordered, de-duplicated collection of degradation notes
#[derive(Debug, Clone, Default)]
pub struct DegradationLog {
    notes: Vec<Degradation>,
}

impl DegradationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, kind: DegradationKind, detail: impl Into<String>) {
        let note = Degradation::new(kind, detail);
        if !self.notes.contains(&note) {
            tracing::debug!("degraded result: {}", note);
            self.notes.push(note);
        }
    }

    pub fn extend(&mut self, other: impl IntoIterator<Item = Degradation>) {
        for note in other {
            self.record(note.kind, note.detail);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn confidence(&self) -> Confidence {
        Confidence::from_notes(&self.notes)
    }

    pub fn into_notes(self) -> Vec<Degradation> {
        self.notes
    }

    pub fn notes(&self) -> &[Degradation] {
        &self.notes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_display_includes_position() {
        let err = ParseError::new("Expected 'end'", Position::new(4, 2, 40))
            .with_expected("end")
            .with_found("EOF");
        assert_eq!(err.to_string(), "Expected 'end' at 4:2");
        assert_eq!(err.expected, vec!["end".to_string()]);
        assert_eq!(err.found.as_deref(), Some("EOF"));
    }

    #[test]
    fn log_deduplicates_and_downgrades_confidence() {
        let mut log = DegradationLog::new();
        assert_eq!(log.confidence(), Confidence::Exact);

        log.record(DegradationKind::UnhandledNode, "ActionStatement at line 3");
        log.record(DegradationKind::UnhandledNode, "ActionStatement at line 3");
        assert_eq!(log.notes().len(), 1);
        assert_eq!(log.confidence(), Confidence::BestEffort);
    }
}
