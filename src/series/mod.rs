/*!
# Series Solver

Reduces symbolic costs to closed form and extracts asymptotic notation.

For each of the best, average and worst cases the solver parses the cost
text, resolves summations innermost-first, expands to exact rational
coefficients, factors when that does not lengthen the result, and picks the
dominant term. Every transformation is recorded as a numbered
[`DerivationStep`].
*/

pub mod solver;

pub use solver::SeriesSolver;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::{Confidence, Degradation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Case {
    Best,
    #[serde(rename = "avg")]
    Average,
    Worst,
}

impl fmt::Display for Case {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Case::Best => write!(f, "best"),
            Case::Average => write!(f, "avg"),
            Case::Worst => write!(f, "worst"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivationStep {
    pub step: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case: Option<Case>,
    pub description: String,
    pub expression: String,
}

/// Fully simplified closed forms
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExactCosts {
    pub best: String,
    pub avg: String,
    pub worst: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BigO {
    pub best: String,
    pub avg: String,
    pub worst: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub omega: String,
    pub theta: String,
    pub big_o: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveOutput {
    pub exact: ExactCosts,
    pub big_o: BigO,
    pub bounds: Bounds,
    pub steps: Vec<DerivationStep>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps_by_line: Vec<DerivationStep>,
    pub confidence: Confidence,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<Degradation>,
}
