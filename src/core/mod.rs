/*!
# Core Module

Source locations and the error taxonomy shared by every analysis stage.
*/

pub mod errors;
pub mod position;

pub use errors::{
    AnalysisError, AnalysisResult, Confidence, Degradation, DegradationKind, DegradationLog,
    ParseError,
};
pub use position::{LineSpan, Position};
